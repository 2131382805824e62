//! Per-connection session state
//!
//! A [`Session`] owns the client stream and, once dialed, the destination
//! stream. Stages only move forward and the relay stage cannot be entered
//! without both a successful authentication and an open destination.
//! [`Session::close`] is the single place either stream is released.

use super::relay::{relay, RelayStats};
use crate::error::SocksError;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Session stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Accepted, nothing read yet
    New,
    /// Greeting and username/password sub-negotiation
    Authenticating,
    /// Reading the CONNECT request and dialing the destination
    Negotiating,
    /// Relaying bytes
    Relaying,
    /// Both streams released
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::New => "new",
            Stage::Authenticating => "authenticating",
            Stage::Negotiating => "negotiating",
            Stage::Relaying => "relaying",
            Stage::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// State of one proxied connection
pub struct Session<S> {
    stage: Stage,
    client: Option<S>,
    destination: Option<TcpStream>,
    authenticated: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session for a freshly accepted client stream
    pub fn new(client: S) -> Self {
        Self {
            stage: Stage::New,
            client: Some(client),
            destination: None,
            authenticated: false,
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether the client passed username/password authentication
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The destination connection, once dialed
    pub fn destination(&self) -> Option<&TcpStream> {
        self.destination.as_ref()
    }

    /// The client stream, unless the session is closed
    pub fn client(&mut self) -> Result<&mut S, SocksError> {
        self.client.as_mut().ok_or_else(|| not_connected("client stream is closed"))
    }

    /// `New -> Authenticating`
    pub fn begin_authentication(&mut self) {
        debug_assert_eq!(self.stage, Stage::New);
        self.stage = Stage::Authenticating;
    }

    /// `Authenticating -> Negotiating`, recording the successful login
    pub fn mark_authenticated(&mut self) {
        debug_assert_eq!(self.stage, Stage::Authenticating);
        self.authenticated = true;
        self.stage = Stage::Negotiating;
    }

    /// Take ownership of the dialed destination connection
    pub fn attach_destination(&mut self, destination: TcpStream) {
        debug_assert_eq!(self.stage, Stage::Negotiating);
        debug_assert!(self.destination.is_none());
        self.destination = Some(destination);
    }

    /// `Negotiating -> Relaying`: run the relay until either direction ends
    ///
    /// Fails without touching the streams unless the session is authenticated
    /// and has a destination.
    pub async fn relay(&mut self) -> Result<RelayStats, SocksError> {
        if self.stage != Stage::Negotiating || !self.authenticated {
            return Err(not_connected("session is not ready to relay"));
        }
        let (client, destination) = match (self.client.take(), self.destination.take()) {
            (Some(client), Some(destination)) => (client, destination),
            (client, destination) => {
                self.client = client;
                self.destination = destination;
                return Err(not_connected("session is not ready to relay"));
            }
        };

        self.stage = Stage::Relaying;
        let relayed = relay(client, destination).await;
        self.client = relayed.client;
        self.destination = relayed.destination;

        relayed.result.map(|()| relayed.stats).map_err(SocksError::from)
    }

    /// Release both streams: destination first, then the client
    ///
    /// Returns `true` the first time and `false` on every later call.
    pub async fn close(&mut self) -> bool {
        if self.stage == Stage::Closed {
            return false;
        }
        self.stage = Stage::Closed;

        if let Some(mut destination) = self.destination.take() {
            if let Err(e) = destination.shutdown().await {
                debug!("Failed to shut down destination: {}", e);
            }
        }
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.shutdown().await {
                debug!("Failed to shut down client: {}", e);
            }
        }
        true
    }
}

fn not_connected(message: &'static str) -> SocksError {
    SocksError::Io(io::Error::new(io::ErrorKind::NotConnected, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};
    use tokio::net::TcpListener;

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (connected, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (connected.unwrap(), accepted.unwrap().0)
    }

    fn session() -> (Session<DuplexStream>, DuplexStream) {
        let (client, server) = duplex(1024);
        (Session::new(server), client)
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::New.to_string(), "new");
        assert_eq!(Stage::Relaying.to_string(), "relaying");
    }

    #[tokio::test]
    async fn test_session_stages() {
        let (mut session, _client) = session();
        assert_eq!(session.stage(), Stage::New);
        assert!(!session.is_authenticated());

        session.begin_authentication();
        assert_eq!(session.stage(), Stage::Authenticating);

        session.mark_authenticated();
        assert_eq!(session.stage(), Stage::Negotiating);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_relay_requires_authentication() {
        let (mut session, _client) = session();
        let (destination, _remote) = tcp_pair().await;
        session.begin_authentication();
        session.stage = Stage::Negotiating;
        session.destination = Some(destination);

        let err = session.relay().await.unwrap_err();
        assert!(matches!(err, SocksError::Io(ref e) if e.kind() == io::ErrorKind::NotConnected));
        // Streams stay with the session for close
        assert!(session.destination().is_some());
        assert!(session.client().is_ok());
    }

    #[tokio::test]
    async fn test_relay_requires_destination() {
        let (mut session, _client) = session();
        session.begin_authentication();
        session.mark_authenticated();

        assert!(session.relay().await.is_err());
        assert_eq!(session.stage(), Stage::Negotiating);
        assert!(session.client().is_ok());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut session, mut client) = session();
        let (destination, mut remote) = tcp_pair().await;
        session.begin_authentication();
        session.mark_authenticated();
        session.attach_destination(destination);

        assert!(session.close().await);
        assert!(!session.close().await);
        assert!(!session.close().await);
        assert_eq!(session.stage(), Stage::Closed);
        assert!(session.destination().is_none());
        assert!(session.client().is_err());

        // Both peers observe exactly one clean EOF
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
        remote.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_close_after_relay_releases_both_streams() {
        let (mut session, mut client) = session();
        let (destination, mut remote) = tcp_pair().await;
        session.begin_authentication();
        session.mark_authenticated();
        session.attach_destination(destination);

        let relay = tokio::spawn(async move {
            let stats = session.relay().await;
            let first_close = session.close().await;
            let second_close = session.close().await;
            (stats, first_close, second_close)
        });

        remote.write_all(b"pong").await.unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");

        // Remote hangs up; the client must see EOF once the session closes
        drop(remote);
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());

        let (stats, first_close, second_close) = relay.await.unwrap();
        assert_eq!(stats.unwrap().download, 4);
        assert!(first_close);
        assert!(!second_close);
    }
}
