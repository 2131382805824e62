//! IPv4 address codec
//!
//! Encodes and decodes the fixed `DST.ADDR`/`BND.ADDR` + port structure
//! shared by requests and replies:
//!
//! ```text
//! +----------+----------+
//! |   ADDR   |   PORT   |
//! +----------+----------+
//! |    4     |    2     |
//! +----------+----------+
//! ```
//!
//! Both fields are in network byte order.

use super::consts::IPV4_ADDR_LEN;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Encode an address and port into its 6-byte wire form
pub fn encode(addr: SocketAddrV4) -> [u8; IPV4_ADDR_LEN] {
    let mut buf = [0u8; IPV4_ADDR_LEN];
    buf[..4].copy_from_slice(&addr.ip().octets());
    buf[4..].copy_from_slice(&addr.port().to_be_bytes());
    buf
}

/// Decode the 6-byte wire form into an address and port
pub fn decode(buf: [u8; IPV4_ADDR_LEN]) -> SocketAddrV4 {
    let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
    let port = u16::from_be_bytes([buf[4], buf[5]]);
    SocketAddrV4::new(ip, port)
}

/// `0.0.0.0:0`, the bound address of a failure reply
pub fn unspecified() -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)
}

/// Narrow a socket's local address to the IPv4 form a reply can carry.
///
/// IPv4-mapped IPv6 addresses are unwrapped; anything else has no IPv4
/// representation and is reported as `0.0.0.0` with the original port.
pub fn to_v4(addr: SocketAddr) -> SocketAddrV4 {
    match addr {
        SocketAddr::V4(v4) => v4,
        SocketAddr::V6(v6) => {
            let ip = v6.ip().to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED);
            SocketAddrV4::new(ip, v6.port())
        }
    }
}
