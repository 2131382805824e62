//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages.

use crate::socks::addr;
use crate::socks::consts::*;
use std::net::SocketAddrV4;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Reply codes this server sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = SOCKS5_REPLY_SUCCEEDED,
    /// General SOCKS server failure
    GeneralFailure = SOCKS5_REPLY_GENERAL_FAILURE,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

/// A SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   |    4     |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Reply status
    pub code: ReplyCode,
    /// Bound address reported to the client
    pub bound: SocketAddrV4,
}

impl Reply {
    /// Successful CONNECT, reporting the destination socket's local address
    pub fn succeeded(bound: SocketAddrV4) -> Self {
        Self {
            code: ReplyCode::Succeeded,
            bound,
        }
    }

    /// Failed CONNECT; the bound address stays `0.0.0.0:0`
    pub fn general_failure() -> Self {
        Self {
            code: ReplyCode::GeneralFailure,
            bound: addr::unspecified(),
        }
    }

    /// Serialize the reply
    pub fn to_bytes(&self) -> [u8; REPLY_LEN] {
        let mut reply = [0u8; REPLY_LEN];
        reply[..REQUEST_HEADER_LEN].copy_from_slice(&[
            SOCKS5_VERSION,
            self.code.into(),
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ]);
        reply[REQUEST_HEADER_LEN..].copy_from_slice(&addr::encode(self.bound));
        reply
    }

    /// Write the reply and flush the stream
    pub async fn write_to<S>(&self, stream: &mut S) -> std::io::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&self.to_bytes()).await?;
        stream.flush().await
    }
}
