//! Test utilities for Socksgate
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksgate::config::{Config, ServerConfig, UserConfig};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Spawn an echo server that serves connections until the test ends
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// An address nothing listens on
pub async fn unreachable_addr() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Test configuration builder
pub struct TestConfigBuilder {
    listen: String,
    public_host: Option<String>,
    shutdown_grace: u64,
    users: Vec<(String, String)>,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            listen: "127.0.0.1:0".to_string(),
            public_host: None,
            shutdown_grace: 1,
            users: vec![("user".to_string(), "pass".to_string())],
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set listen address
    pub fn listen(mut self, addr: &str) -> Self {
        self.listen = addr.to_string();
        self
    }

    /// Set public host
    pub fn public_host(mut self, host: &str) -> Self {
        self.public_host = Some(host.to_string());
        self
    }

    /// Set shutdown grace period
    pub fn shutdown_grace(mut self, secs: u64) -> Self {
        self.shutdown_grace = secs;
        self
    }

    /// Add a user
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users.push((username.to_string(), password.to_string()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        Config {
            server: ServerConfig {
                listen: self.listen,
                public_host: self.public_host,
                shutdown_grace: self.shutdown_grace,
                ..Default::default()
            },
            users: self
                .users
                .into_iter()
                .map(|(username, password)| UserConfig { username, password })
                .collect(),
        }
    }
}

/// A running server and the means to stop it
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown_tx: tokio::sync::broadcast::Sender<bool>,
    pub handle: JoinHandle<anyhow::Result<()>>,
}

/// Bind and spawn a server for `config`
pub async fn spawn_server(config: Config) -> TestServer {
    let server = socksgate::Server::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(server.run(shutdown_rx));
    TestServer {
        addr,
        shutdown_tx,
        handle,
    }
}

/// Connect, negotiate username/password and log in; returns the auth status
pub async fn login(addr: SocketAddr, username: &str, password: &str) -> (TcpStream, u8) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(&socks5_mock::create_method_request(&[
            socksgate::socks::SOCKS5_AUTH_METHOD_PASSWORD,
        ]))
        .await
        .unwrap();
    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x02]);

    stream
        .write_all(&socks5_mock::create_password_auth(username, password))
        .await
        .unwrap();
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0x01);
    (stream, reply[1])
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socksgate::socks::*;
    use std::net::SocketAddr;

    /// Create a method selection request offering `methods`
    pub fn create_method_request(methods: &[u8]) -> Vec<u8> {
        let mut request = vec![SOCKS5_VERSION, methods.len() as u8];
        request.extend_from_slice(methods);
        request
    }

    /// Create a username/password sub-negotiation
    pub fn create_password_auth(username: &str, password: &str) -> Vec<u8> {
        let mut request = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        request.extend_from_slice(username.as_bytes());
        request.push(password.len() as u8);
        request.extend_from_slice(password.as_bytes());
        request
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to a loopback test address
    pub fn create_connect(addr: SocketAddr) -> Vec<u8> {
        match addr {
            SocketAddr::V4(v4) => create_connect_ipv4(v4.ip().octets(), v4.port()),
            SocketAddr::V6(_) => panic!("test addresses are IPv4"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[test]
    fn test_config_builder() {
        let config = TestConfigBuilder::new()
            .listen("127.0.0.1:1081")
            .public_host("proxy.example.com")
            .user("bob", "builder")
            .build();

        assert_eq!(config.server.listen, "127.0.0.1:1081");
        assert_eq!(config.users.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socks5_mock_connect_ipv4() {
        let cmd = socks5_mock::create_connect_ipv4([192, 168, 1, 1], 8080);
        assert_eq!(cmd[0], 5); // SOCKS5 version
        assert_eq!(cmd[1], 1); // CONNECT
        assert_eq!(cmd[3], 1); // IPv4
        assert_eq!(&cmd[4..8], &[192, 168, 1, 1]);
        assert_eq!(&cmd[8..], &[0x1F, 0x90]);
    }
}
