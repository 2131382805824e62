//! TCP relay for the SOCKS5 CONNECT command
//!
//! Copies bytes between the client and the destination in both directions.
//! The client-to-destination direction runs on its own task, the
//! destination-to-client direction on the caller's task. Whichever direction
//! finishes first (EOF or error) cancels a shared teardown token, which stops
//! the other direction promptly. Both directions then hand their halves back
//! so the session can close each stream exactly once.

use crate::helper::DEFAULT_BUFFER_SIZE;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

/// Bytes moved by a finished relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Client to destination
    pub upload: u64,
    /// Destination to client
    pub download: u64,
}

/// Streams and outcome handed back by [`relay`]
///
/// A stream is `None` only if the task owning one of its halves panicked, in
/// which case that half was dropped (and the socket closed) with the task.
#[derive(Debug)]
pub struct Relayed<C> {
    /// The client stream, reassembled
    pub client: Option<C>,
    /// The destination stream, reassembled
    pub destination: Option<TcpStream>,
    /// Bytes moved in each direction
    pub stats: RelayStats,
    /// First I/O error from either direction
    pub result: io::Result<()>,
}

/// Relay data bidirectionally between the client and the destination
///
/// Returns once both directions have stopped. Neither stream is shut down
/// here; that is left to the caller's close path.
pub async fn relay<C>(client: C, destination: TcpStream) -> Relayed<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let teardown = CancellationToken::new();
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut dest_read, mut dest_write) = destination.into_split();

    let upstream = {
        let teardown = teardown.clone();
        tokio::spawn(
            async move {
                let mut upload = 0;
                let result = pipe(&mut client_read, &mut dest_write, &teardown, &mut upload).await;
                teardown.cancel();
                (client_read, dest_write, upload, result)
            }
            .in_current_span(),
        )
    };

    let mut download = 0;
    let downstream = pipe(&mut dest_read, &mut client_write, &teardown, &mut download).await;
    teardown.cancel();

    if let Err(e) = &downstream {
        warn!("Failed to relay destination -> client: {}", e);
    }

    match upstream.await {
        Ok((client_read, dest_write, upload, upstream_result)) => {
            if let Err(e) = &upstream_result {
                warn!("Failed to relay client -> destination: {}", e);
            }
            let stats = RelayStats { upload, download };
            debug!(
                upload = stats.upload,
                download = stats.download,
                "Relay finished"
            );

            Relayed {
                client: Some(client_read.unsplit(client_write)),
                destination: dest_read.reunite(dest_write).ok(),
                stats,
                result: downstream.and(upstream_result),
            }
        }
        Err(join_error) => {
            warn!("Client -> destination task failed: {}", join_error);
            Relayed {
                client: None,
                destination: None,
                stats: RelayStats {
                    upload: 0,
                    download,
                },
                result: Err(io::Error::new(io::ErrorKind::Other, join_error)),
            }
        }
    }
}

/// Copy from `reader` to `writer` until EOF, error, or teardown
async fn pipe<R, W>(
    reader: &mut R,
    writer: &mut W,
    teardown: &CancellationToken,
    transferred: &mut u64,
) -> io::Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
    loop {
        let n = tokio::select! {
            _ = teardown.cancelled() => return Ok(()),
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            return Ok(());
        }

        tokio::select! {
            _ = teardown.cancelled() => return Ok(()),
            written = async {
                writer.write_all(&buf[..n]).await?;
                writer.flush().await
            } => written?,
        }
        *transferred += n as u64;
    }
}
