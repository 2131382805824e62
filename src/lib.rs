//! # Socksgate - Authenticating SOCKS5 Proxy
//!
//! Socksgate is a small SOCKS5 server that only speaks username/password
//! authentication and the CONNECT command to IPv4 destinations. Everything
//! else a client may ask for is refused.
//!
//! ## Features
//!
//! - **Username/Password Only**: RFC 1929 authentication against a fixed user list
//! - **Timing-Safe Checks**: every configured credential is compared on each login
//! - **CONNECT over IPv4**: no BIND, no UDP ASSOCIATE, no domain names
//! - **Graceful Shutdown**: stops accepting, then drains in-flight sessions
//! - **Share Links**: optional Telegram `t.me/socks` links per user
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksgate::config::load_config;
//! use socksgate::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("socksgate.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> Server (accept) -> Session (auth, request, dial) -> Relay <-> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod links;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ProtocolViolation, SocksError};
pub use server::{run_server, Server};

/// Version of the Socksgate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "socksgate");
    }
}
