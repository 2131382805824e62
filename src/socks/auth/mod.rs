//! SOCKS5 authentication module
//!
//! Handles method negotiation and RFC 1929 username/password authentication.
//! Username/password is the only method this server accepts.

mod authenticator;
mod password;

pub use authenticator::{Authenticator, Credential};
pub use password::authenticate_password;

use super::consts::*;
use super::{read_byte, read_frame};
use crate::error::{ProtocolViolation, SocksError};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Perform the greeting / method selection exchange
///
/// ```text
/// +----+----------+----------+      +----+--------+
/// |VER | NMETHODS | METHODS  |  ->  |VER | METHOD |
/// +----+----------+----------+      +----+--------+
/// | 1  |    1     | 1 to 255 |      | 1  |   1    |
/// +----+----------+----------+      +----+--------+
/// ```
///
/// A bad version aborts without a reply. When username/password is not
/// offered the server answers `0xFF` and aborts without reading further.
pub async fn negotiate_method<S>(stream: &mut S) -> Result<u8, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let version = read_byte(stream, "greeting").await?;
    if version != SOCKS5_VERSION {
        return Err(ProtocolViolation::UnsupportedVersion(version).into());
    }

    let num_methods = read_byte(stream, "greeting").await?;
    let mut methods = vec![0u8; num_methods as usize];
    read_frame(stream, &mut methods, "greeting").await?;

    let method = select_method(&methods);
    stream.write_all(&[SOCKS5_VERSION, method]).await?;
    stream.flush().await?;

    if method == SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE {
        return Err(ProtocolViolation::NoAcceptableMethod(methods).into());
    }

    debug!("Selected authentication method {:#04x}", method);
    Ok(method)
}

/// Pick username/password if the client offers it
fn select_method(methods: &[u8]) -> u8 {
    if methods.contains(&SOCKS5_AUTH_METHOD_PASSWORD) {
        SOCKS5_AUTH_METHOD_PASSWORD
    } else {
        SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE
    }
}
