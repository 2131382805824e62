//! SOCKS5 request parser
//!
//! Parses the CONNECT request from the client.

use crate::error::{ProtocolViolation, SocksError};
use crate::socks::addr;
use crate::socks::consts::*;
use crate::socks::read_frame;
use std::net::SocketAddrV4;
use tokio::io::AsyncRead;

/// A validated CONNECT request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Protocol version (always 5 once validated)
    pub version: u8,
    /// Command (always CONNECT once validated)
    pub command: u8,
    /// Reserved byte (always 0 once validated)
    pub reserved: u8,
    /// Address type (always IPv4 once validated)
    pub address_type: u8,
    /// Requested destination
    pub destination: SocketAddrV4,
}

impl Request {
    /// Validate a raw `VER CMD RSV ATYP` header
    pub fn check_header(header: [u8; REQUEST_HEADER_LEN]) -> Result<(), ProtocolViolation> {
        let [version, command, reserved, address_type] = header;

        if version != SOCKS5_VERSION {
            return Err(ProtocolViolation::UnsupportedVersion(version));
        }
        if command != SOCKS5_CMD_TCP_CONNECT {
            return Err(ProtocolViolation::CommandNotSupported(command));
        }
        if reserved != SOCKS5_RESERVED {
            return Err(ProtocolViolation::InvalidReserved(reserved));
        }
        if address_type != SOCKS5_ADDR_TYPE_IPV4 {
            return Err(ProtocolViolation::AddressTypeNotSupported(address_type));
        }
        Ok(())
    }
}

/// Parse a SOCKS5 request from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   |    4     |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Only `CMD = 1` (CONNECT) and `ATYP = 1` (IPv4) are accepted. The header is
/// validated before the address is read, so a rejected header leaves the
/// address bytes unread.
pub async fn parse_request<S>(stream: &mut S) -> Result<Request, SocksError>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; REQUEST_HEADER_LEN];
    read_frame(stream, &mut header, "request header").await?;
    Request::check_header(header)?;

    let mut address = [0u8; IPV4_ADDR_LEN];
    read_frame(stream, &mut address, "request address").await?;
    let [version, command, reserved, address_type] = header;

    let request = Request {
        version,
        command,
        reserved,
        address_type,
        destination: addr::decode(address),
    };

    tracing::debug!("Parsed CONNECT request to {}", request.destination);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    fn create_connect_request_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    #[tokio::test]
    async fn test_parse_request_ipv4() {
        let request = create_connect_request_ipv4([192, 168, 1, 1], 8080);
        let mut cursor = Cursor::new(request);

        let request = parse_request(&mut cursor).await.unwrap();

        assert_eq!(request.version, SOCKS5_VERSION);
        assert_eq!(request.command, SOCKS5_CMD_TCP_CONNECT);
        assert_eq!(request.address_type, SOCKS5_ADDR_TYPE_IPV4);
        assert_eq!(*request.destination.ip(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(request.destination.port(), 8080);
    }

    #[tokio::test]
    async fn test_parse_request_scenario_bytes() {
        let bytes = [0x05, 0x01, 0x00, 0x01, 0x7F, 0x00, 0x00, 0x01, 0x00, 0x50];
        let mut cursor = Cursor::new(bytes.to_vec());

        let request = parse_request(&mut cursor).await.unwrap();
        assert_eq!(request.destination, "127.0.0.1:80".parse().unwrap());
    }

    #[tokio::test]
    async fn test_parse_request_invalid_version() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[0] = 4; // SOCKS4

        let mut cursor = Cursor::new(request);
        let err = parse_request(&mut cursor).await.unwrap_err();

        assert!(matches!(
            err,
            SocksError::Protocol(ProtocolViolation::UnsupportedVersion(4))
        ));
    }

    #[tokio::test]
    async fn test_parse_request_rejects_bind_and_udp() {
        for command in [0x02, 0x03, 0x99] {
            let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
            request[1] = command;

            let mut cursor = Cursor::new(request);
            let err = parse_request(&mut cursor).await.unwrap_err();
            assert!(matches!(
                err,
                SocksError::Protocol(ProtocolViolation::CommandNotSupported(c)) if c == command
            ));
        }
    }

    #[tokio::test]
    async fn test_parse_request_nonzero_reserved() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[2] = 0x01;

        let mut cursor = Cursor::new(request);
        let err = parse_request(&mut cursor).await.unwrap_err();
        assert!(matches!(
            err,
            SocksError::Protocol(ProtocolViolation::InvalidReserved(1))
        ));
    }

    #[tokio::test]
    async fn test_parse_request_rejects_domain_and_ipv6() {
        for atyp in [0x03, 0x04] {
            let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
            request[3] = atyp;

            let mut cursor = Cursor::new(request);
            let err = parse_request(&mut cursor).await.unwrap_err();
            assert!(matches!(
                err,
                SocksError::Protocol(ProtocolViolation::AddressTypeNotSupported(a)) if a == atyp
            ));
            // Address bytes stay unread
            assert_eq!(cursor.position(), 4);
        }
    }

    #[tokio::test]
    async fn test_parse_request_truncated_address() {
        let request = vec![0x05, 0x01, 0x00, 0x01, 10, 0];
        let mut cursor = Cursor::new(request);

        let err = parse_request(&mut cursor).await.unwrap_err();
        assert!(matches!(
            err,
            SocksError::Protocol(ProtocolViolation::Truncated("request address"))
        ));
    }

    #[test]
    fn test_check_header_order() {
        // Version is checked before the command
        assert_eq!(
            Request::check_header([0x04, 0x02, 0x00, 0x01]),
            Err(ProtocolViolation::UnsupportedVersion(4))
        );
        assert_eq!(Request::check_header([0x05, 0x01, 0x00, 0x01]), Ok(()));
    }
}
