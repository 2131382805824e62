//! SOCKS5 module for Socksgate
//!
//! This module implements the per-connection SOCKS5 state machine: method
//! negotiation, username/password authentication, CONNECT request parsing,
//! and the bidirectional relay between client and destination.

pub mod addr;
mod auth;
mod command;
mod consts;
mod handler;
mod relay;
mod session;

pub use auth::{authenticate_password, negotiate_method, Authenticator, Credential};
pub use command::{parse_request, Reply, ReplyCode, Request};
pub use consts::*;
pub use handler::{handle_connection, SocksContext};
pub use relay::{relay, Relayed, RelayStats};
pub use session::{Session, Stage};

use crate::error::{ProtocolViolation, SocksError};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Fill `buf` from the stream; a peer that closes mid-frame is a protocol
/// violation rather than a transport error.
pub(crate) async fn read_frame<S>(
    stream: &mut S,
    buf: &mut [u8],
    frame: &'static str,
) -> Result<(), SocksError>
where
    S: AsyncRead + Unpin,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(ProtocolViolation::Truncated(frame).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a single byte of `frame`
pub(crate) async fn read_byte<S>(stream: &mut S, frame: &'static str) -> Result<u8, SocksError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];
    read_frame(stream, &mut buf, frame).await?;
    Ok(buf[0])
}
