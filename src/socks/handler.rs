//! Main SOCKS5 handler
//!
//! This module provides the entry point for a single client connection. It
//! drives a [`Session`] through authentication, request parsing, dialing and
//! relaying, and always finishes through the session's close path.

use super::addr;
use super::auth::{authenticate_password, negotiate_method, Authenticator};
use super::command::{parse_request, Reply};
use super::relay::RelayStats;
use super::session::Session;
use crate::config::Config;
use crate::error::SocksError;
use crate::transport::{SocketOpts, TcpDialer};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

/// Read-only state shared by every session
#[derive(Debug, Default)]
pub struct SocksContext {
    authenticator: Authenticator,
    dialer: TcpDialer,
}

impl SocksContext {
    /// Create a context from its parts
    pub fn new(authenticator: Authenticator, dialer: TcpDialer) -> Self {
        Self {
            authenticator,
            dialer,
        }
    }

    /// Build the context from configuration
    pub fn from_config(config: &Config) -> Self {
        let dialer = TcpDialer::with_defaults()
            .with_socket_opts(SocketOpts::for_destination(&config.server))
            .with_connect_timeout(Duration::from_secs(config.server.connect_timeout));

        Self::new(Authenticator::from_users(&config.users), dialer)
    }

    /// Configured credentials
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Dialer for destination connections
    pub fn dialer(&self) -> &TcpDialer {
        &self.dialer
    }
}

/// Handle SOCKS5 protocol on a client stream
///
/// # Protocol Flow
///
/// 1. Method negotiation (username/password only)
/// 2. Username/password authentication
/// 3. CONNECT request parsing
/// 4. Destination dial and reply
/// 5. Bidirectional relay
///
/// Both streams are closed before this returns, whatever the outcome. The
/// result is also logged here, so callers may ignore it.
pub async fn handle_connection<S>(
    stream: S,
    context: Arc<SocksContext>,
) -> Result<RelayStats, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    info!("Connection established.");

    let mut session = Session::new(stream);
    let result = run_session(&mut session, &context).await;
    let stage = session.stage();
    session.close().await;

    match &result {
        Ok(stats) => info!(
            upload = stats.upload,
            download = stats.download,
            "Connection closed."
        ),
        Err(e @ SocksError::Io(_)) => {
            error!(kind = e.kind(), %stage, "Connection closed: {}", e)
        }
        Err(e) => warn!(kind = e.kind(), %stage, "Connection closed: {}", e),
    }

    result
}

async fn run_session<S>(
    session: &mut Session<S>,
    context: &SocksContext,
) -> Result<RelayStats, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    session.begin_authentication();
    negotiate_method(session.client()?).await?;
    let username = authenticate_password(session.client()?, context.authenticator()).await?;
    session.mark_authenticated();
    info!(user = %username, "Connection authenticated.");

    let request = parse_request(session.client()?).await?;
    let target = request.destination;
    info!("Connecting to {} ...", target);

    let destination = match context.dialer().connect(target).await {
        Ok(stream) => stream,
        Err(source) => {
            Reply::general_failure()
                .write_to(session.client()?)
                .await?;
            return Err(SocksError::Dial {
                addr: target,
                source,
            });
        }
    };

    let local_addr = destination.local_addr();
    session.attach_destination(destination);
    let bound = addr::to_v4(local_addr?);

    Reply::succeeded(bound).write_to(session.client()?).await?;
    info!("Connection {} -> {} is established.", bound, target);

    session.relay().await
}
