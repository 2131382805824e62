//! SOCKS5 listener
//!
//! Accepts client connections and runs one session task per connection until
//! a shutdown signal arrives. On shutdown the listener is closed first, then
//! in-flight sessions get `shutdown_grace` to finish before they are aborted.

use crate::config::Config;
use crate::helper::{accept_backoff, duration_from_secs, ACCEPT_BACKOFF_MAX_SECS};
use crate::socks::{handle_connection, RelayStats, SocksContext};
use crate::error::SocksError;
use crate::transport::SocketOpts;
use anyhow::{anyhow, Context, Result};
use backoff::backoff::Backoff;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, info_span, warn, Instrument};

/// Bound SOCKS5 server
pub struct Server {
    listener: TcpListener,
    context: Arc<SocksContext>,
    socket_opts: SocketOpts,
    shutdown_grace: Duration,
}

impl Server {
    /// Bind the listen address from the configuration
    pub async fn bind(config: &Config) -> Result<Self> {
        let addr = config.server.listen_addr().map_err(|e| anyhow!(e))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Server {
            listener,
            context: Arc::new(SocksContext::from_config(config)),
            socket_opts: SocketOpts::for_client(&config.server),
            shutdown_grace: duration_from_secs(config.server.shutdown_grace),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until shutdown, then drain sessions
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let Server {
            listener,
            context,
            socket_opts,
            shutdown_grace,
        } = self;

        info!("Listening on {}", listener.local_addr()?);

        let mut sessions = JoinSet::new();
        let mut backoff = accept_backoff();
        let mut next_id: u64 = 0;

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        backoff.reset();
                        if let Err(e) = socket_opts.apply(&stream) {
                            warn!("Failed to set socket options for {}: {}", peer, e);
                        }

                        next_id += 1;
                        let span = info_span!("session", id = next_id, %peer);
                        sessions.spawn(
                            handle_connection(stream, context.clone()).instrument(span),
                        );
                    }
                    Err(e) => {
                        let delay = backoff
                            .next_backoff()
                            .unwrap_or(Duration::from_secs(ACCEPT_BACKOFF_MAX_SECS));
                        warn!("Failed to accept: {}. Retry in {:?}...", e, delay);

                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown_rx.recv() => {
                                info!("Shutdown signal received, stopping listener");
                                break;
                            }
                        }
                    }
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    reap(joined);
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        drop(listener);
        drain(&mut sessions, shutdown_grace).await;

        info!("Server stopped");
        Ok(())
    }
}

/// Wait up to `grace` for sessions to finish, then abort the rest
async fn drain(sessions: &mut JoinSet<Result<RelayStats, SocksError>>, grace: Duration) {
    if sessions.is_empty() {
        return;
    }
    info!("Waiting up to {:?} for {} sessions", grace, sessions.len());

    let finished = tokio::time::timeout(grace, async {
        while let Some(joined) = sessions.join_next().await {
            reap(joined);
        }
    })
    .await;

    if finished.is_err() {
        warn!("Aborting {} sessions still open", sessions.len());
        sessions.shutdown().await;
    }
}

/// Session outcomes are logged by the handler; only task failures are left
fn reap(joined: std::result::Result<Result<RelayStats, SocksError>, JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("Session task panicked: {}", e);
        }
    }
}

/// Bind and run the server until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    Server::bind(&config).await?.run(shutdown_rx).await
}
