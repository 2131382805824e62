//! Error types for Socksgate
//!
//! A session ends with exactly one [`SocksError`]. The protocol's own status
//! bytes are the only thing the peer ever learns about it; the error itself is
//! only logged.

use std::io;
use std::net::SocketAddrV4;
use thiserror::Error;

/// Terminal outcome of a failed SOCKS5 session
#[derive(Error, Debug)]
pub enum SocksError {
    /// Malformed or unsupported field at any stage
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Credentials did not match any configured user
    #[error("Authentication failed for user {username:?}")]
    Auth {
        /// Username presented by the client, lossily decoded
        username: String,
    },

    /// Destination could not be reached
    #[error("Failed to connect to {addr}: {source}")]
    Dial {
        /// Requested destination
        addr: SocketAddrV4,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },

    /// Transport failure on either stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SocksError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SocksError::Protocol(_) => "protocol",
            SocksError::Auth { .. } => "auth",
            SocksError::Dial { .. } => "dial",
            SocksError::Io(_) => "io",
        }
    }
}

/// A field that violates the SOCKS5 dialect this server accepts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Greeting or request version other than 5
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Client did not offer username/password authentication
    #[error("No acceptable authentication method in {0:?}")]
    NoAcceptableMethod(Vec<u8>),

    /// Sub-negotiation version other than 1
    #[error("Unsupported username/password sub-negotiation version: {0}")]
    UnsupportedAuthVersion(u8),

    /// ULEN of zero
    #[error("Empty username")]
    EmptyUsername,

    /// PLEN of zero
    #[error("Empty password")]
    EmptyPassword,

    /// Anything but CONNECT
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// RSV byte other than zero
    #[error("Unexpected reserved byte: {0}")]
    InvalidReserved(u8),

    /// Anything but IPv4
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Peer closed the stream in the middle of a frame
    #[error("Truncated {0}")]
    Truncated(&'static str),
}
