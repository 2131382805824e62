//! Server configuration types
//!
//! Defines the configuration structures for the Socksgate server.

use crate::helper::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_SOCKET_BUFFER_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Longest username or password the RFC 1929 length byte can carry
pub const MAX_CREDENTIAL_LEN: usize = 255;

/// Default listen address
fn default_listen() -> String {
    "0.0.0.0:1080".to_string()
}

/// Default destination connect timeout in seconds
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Default socket buffer size for accepted connections
fn default_socket_buffer_size() -> usize {
    DEFAULT_SOCKET_BUFFER_SIZE
}

/// Default TCP_NODELAY setting
fn default_nodelay() -> bool {
    true
}

/// Default shutdown grace period in seconds
fn default_shutdown_grace() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_SECS
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Accepted users, in order
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;

        if self.users.is_empty() {
            return Err("No users configured".to_string());
        }
        for (index, user) in self.users.iter().enumerate() {
            user.validate()
                .map_err(|e| format!("User #{} ({:?}): {}", index + 1, user.username, e))?;
        }
        Ok(())
    }
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:1080")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Public host name advertised in share links
    #[serde(default)]
    pub public_host: Option<String>,

    /// Destination connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// SO_RCVBUF / SO_SNDBUF for accepted connections (0 = OS default)
    #[serde(default = "default_socket_buffer_size")]
    pub socket_buffer_size: usize,

    /// Enable TCP_NODELAY on client and destination sockets
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// Seconds in-flight sessions may keep running after shutdown
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_host: None,
            connect_timeout: default_connect_timeout(),
            socket_buffer_size: default_socket_buffer_size(),
            nodelay: default_nodelay(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    /// Parse the listen address
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        self.listen
            .parse()
            .map_err(|e| format!("Invalid listen address {:?}: {}", self.listen, e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listen_addr()?;
        if self.connect_timeout == 0 {
            return Err("connect_timeout must be at least 1 second".to_string());
        }
        if let Some(host) = &self.public_host {
            if host.trim().is_empty() {
                return Err("public_host must not be empty".to_string());
            }
        }
        Ok(())
    }
}

/// A single username/password pair
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Username for SOCKS5 auth
    pub username: String,

    /// Password for SOCKS5 auth
    pub password: String,
}

impl UserConfig {
    /// Check the credential fits the wire format
    pub fn validate(&self) -> Result<(), String> {
        check_field("username", &self.username)?;
        check_field("password", &self.password)
    }
}

fn check_field(name: &str, value: &str) -> Result<(), String> {
    match value.len() {
        0 => Err(format!("{} must not be empty", name)),
        len if len > MAX_CREDENTIAL_LEN => Err(format!(
            "{} is {} bytes, at most {} allowed",
            name, len, MAX_CREDENTIAL_LEN
        )),
        _ => Ok(()),
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
