//! SOCKS5 request parsing and reply building.

mod parser;
mod reply;

pub use parser::{parse_request, Request};
pub use reply::{Reply, ReplyCode};
