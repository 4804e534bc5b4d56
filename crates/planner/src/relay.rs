//! Forward a chunk stream to a live client.
//!
//! The relay checks the sink before every pull and races each pull against
//! [`ChunkSink::closed`], so a client that leaves while the model is still
//! thinking stops consumption right away. Dropping the stream at that point
//! releases the upstream response.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};
use travelguide_core::error::GuideError;

/// The client went away while a chunk was being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("client connection is closed")]
pub struct SinkClosed;

/// A connected client that accepts text chunks in order.
///
/// Implementations: the WebSocket adapter in the gateway, stdout in the
/// CLI, and recording doubles in tests.
#[async_trait]
pub trait ChunkSink: Send {
    /// Whether the client is still there to receive chunks.
    fn is_open(&self) -> bool;

    /// Deliver one chunk. Returns [`SinkClosed`] if the client disconnected.
    async fn send_chunk(&mut self, chunk: &str) -> Result<(), SinkClosed>;

    /// Close the connection with an error signal carrying `reason`.
    async fn close_with_error(&mut self, reason: &str);

    /// Resolves once the client has gone away.
    ///
    /// Sinks that only learn about a disconnect from a failed write keep the
    /// default, which never resolves.
    async fn closed(&mut self) {
        futures::future::pending::<()>().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The stream ended and every chunk was delivered.
    Completed { chunks: usize },
    /// The client left first; `chunks` were delivered before that.
    ClientDisconnected { chunks: usize },
}

impl RelayOutcome {
    pub fn chunks(&self) -> usize {
        match self {
            Self::Completed { chunks } | Self::ClientDisconnected { chunks } => *chunks,
        }
    }
}

pub async fn relay<S, K>(mut stream: S, sink: &mut K) -> Result<RelayOutcome, GuideError>
where
    S: Stream<Item = Result<String, GuideError>> + Unpin,
    K: ChunkSink + ?Sized,
{
    let mut chunks = 0;

    loop {
        if !sink.is_open() {
            debug!(chunks, "Client disconnected, stopping relay");
            return Ok(RelayOutcome::ClientDisconnected { chunks });
        }

        let next = tokio::select! {
            next = stream.next() => next,
            () = sink.closed() => {
                debug!(chunks, "Client disconnected while waiting for upstream");
                return Ok(RelayOutcome::ClientDisconnected { chunks });
            }
        };

        match next {
            None => return Ok(RelayOutcome::Completed { chunks }),
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => {
                if sink.send_chunk(&chunk).await.is_err() {
                    debug!(chunks, "Client disconnected mid-send, stopping relay");
                    return Ok(RelayOutcome::ClientDisconnected { chunks });
                }
                chunks += 1;
            }
            Some(Err(e)) => {
                warn!(chunks, error = %e, "Upstream stream failed");
                sink.close_with_error(&e.to_string()).await;
                let err = match e {
                    GuideError::StreamingUpstreamError(_) => e,
                    other => GuideError::StreamingUpstreamError(other.to_string()),
                };
                return Err(err);
            }
        }
    }
}
