//! One-frame-per-connection TCP transport.
//!
//! Sending dials the peer, writes a single frame and closes the write half.
//! The receiving side reads until EOF, decodes the frame and forwards the
//! resulting event into the runner's channel. There is no retry and no
//! connection reuse; a failed dial comes back as `Event::PeerUnreachable`.

use super::codec::{decode_message, CodecError};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokoin_core::Event;
use tracing::{debug, trace, warn};

/// How long an inbound connection may take to deliver its frame and close.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed `accept`, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Errors from the TCP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("Peer did not finish its frame within {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// TCP transport feeding decoded events into the runner.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    event_tx: mpsc::Sender<Event>,
    max_frame_size: usize,
}

impl TcpTransport {
    pub fn new(event_tx: mpsc::Sender<Event>, max_frame_size: usize) -> Self {
        Self {
            event_tx,
            max_frame_size,
        }
    }

    /// Bind the listening socket.
    pub async fn bind(addr: &str) -> Result<TcpListener, TransportError> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Deliver `frame` to `addr` in the background.
    pub fn send(&self, addr: String, frame: Vec<u8>) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            match write_frame(&addr, &frame).await {
                Ok(()) => trace!(peer = %addr, bytes = frame.len(), "Frame sent"),
                Err(TransportError::Connect { addr, source }) => {
                    debug!(peer = %addr, error = %source, "Peer unreachable");
                    let _ = event_tx
                        .send(Event::PeerUnreachable { address: addr })
                        .await;
                }
                Err(e) => warn!(peer = %addr, error = %e, "Failed to send frame"),
            }
        })
    }

    /// Run the accept loop on `listener`, one task per connection.
    ///
    /// The loop ends when the event channel closes.
    pub fn listen(&self, listener: TcpListener) -> JoinHandle<()> {
        let transport = self.clone();
        tokio::spawn(async move {
            loop {
                let (stream, remote) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                if transport.event_tx.is_closed() {
                    break;
                }
                let transport = transport.clone();
                tokio::spawn(async move {
                    match transport.receive(stream).await {
                        Ok(event) => {
                            trace!(remote = %remote, event = event.type_name(), "Frame received");
                            let _ = transport.event_tx.send(event).await;
                        }
                        Err(e) => warn!(remote = %remote, error = %e, "Dropping inbound frame"),
                    }
                });
            }
        })
    }

    async fn receive(&self, stream: TcpStream) -> Result<Event, TransportError> {
        let frame = read_frame(stream, self.max_frame_size, READ_TIMEOUT).await?;
        Ok(decode_message(&frame)?)
    }
}

async fn write_frame(addr: &str, frame: &[u8]) -> Result<(), TransportError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    stream.write_all(frame).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read one frame up to EOF, refusing anything over `limit` bytes or a peer
/// that keeps the connection open past `timeout`.
async fn read_frame(
    stream: TcpStream,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    let mut frame = Vec::new();
    let mut limited = stream.take(limit as u64 + 1);
    let read = limited.read_to_end(&mut frame);
    tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| TransportError::ReadTimeout { timeout })??;
    if frame.len() > limit {
        return Err(TransportError::FrameTooLarge { limit });
    }
    Ok(frame)
}
