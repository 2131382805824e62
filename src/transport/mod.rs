//! Transport module for Socksgate
//!
//! Socket tuning shared by accepted client connections and dialed
//! destination connections, plus the TCP dialer used for CONNECT.

mod tcp;

pub use tcp::TcpDialer;

use crate::config::ServerConfig;
use tokio::net::TcpStream;

/// Socket options for configuring connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// SO_RCVBUF / SO_SNDBUF size; `None` keeps the OS default
    pub buffer_size: Option<usize>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            buffer_size: None,
        }
    }
}

impl SocketOpts {
    /// Options for accepted client sockets
    pub fn for_client(config: &ServerConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            buffer_size: (config.socket_buffer_size > 0).then_some(config.socket_buffer_size),
        }
    }

    /// Options for dialed destination sockets
    pub fn for_destination(config: &ServerConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            buffer_size: None,
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let Some(size) = self.buffer_size {
            let socket = socket2::SockRef::from(stream);
            socket.set_recv_buffer_size(size)?;
            socket.set_send_buffer_size(size)?;
        }

        Ok(())
    }
}
