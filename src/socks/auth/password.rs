//! Username/password authentication handler
//!
//! Implements the RFC 1929 sub-negotiation for SOCKS5.

use super::Authenticator;
use crate::error::{ProtocolViolation, SocksError};
use crate::socks::consts::*;
use crate::socks::{read_byte, read_frame};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Perform username/password authentication
///
/// # Protocol
///
/// Client sends:
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Server responds:
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
///
/// Header violations (version, zero lengths) abort without a status reply and
/// without consulting the authenticator. Once both fields are read a status
/// is always sent.
///
/// Returns the authenticated username.
pub async fn authenticate_password<S>(
    stream: &mut S,
    authenticator: &Authenticator,
) -> Result<String, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let version = read_byte(stream, "authentication request").await?;
    if version != SOCKS5_AUTH_VERSION {
        return Err(ProtocolViolation::UnsupportedAuthVersion(version).into());
    }

    let username_len = read_byte(stream, "authentication request").await?;
    if username_len == 0 {
        return Err(ProtocolViolation::EmptyUsername.into());
    }
    let mut username = vec![0u8; username_len as usize];
    read_frame(stream, &mut username, "username").await?;

    let password_len = read_byte(stream, "authentication request").await?;
    if password_len == 0 {
        return Err(ProtocolViolation::EmptyPassword.into());
    }
    let mut password = vec![0u8; password_len as usize];
    read_frame(stream, &mut password, "password").await?;

    let accepted = authenticator.verify(&username, &password);
    let status = if accepted {
        SOCKS5_AUTH_STATUS_SUCCESS
    } else {
        SOCKS5_AUTH_STATUS_FAILURE
    };
    send_auth_result(stream, status).await?;

    let username = String::from_utf8_lossy(&username).into_owned();
    if accepted {
        Ok(username)
    } else {
        Err(SocksError::Auth { username })
    }
}

/// Send authentication result to client
async fn send_auth_result<S: AsyncWrite + Unpin>(stream: &mut S, status: u8) -> std::io::Result<()> {
    stream.write_all(&[SOCKS5_AUTH_VERSION, status]).await?;
    stream.flush().await
}
