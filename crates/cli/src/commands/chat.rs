//! `travelguide chat`: Stream a travel answer to stdout chunk by chunk.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use travelguide_config::AppConfig;
use travelguide_planner::{ChunkSink, RelayOutcome, SinkClosed, TravelGuideService};

/// Writes chunks straight to a terminal, flushing after each one.
pub struct WriterSink<W> {
    out: W,
    open: bool,
}

impl<W: AsyncWrite + Unpin + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, open: true }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChunkSink for WriterSink<W> {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn send_chunk(&mut self, chunk: &str) -> Result<(), SinkClosed> {
        // A closed pipe (e.g. `| head`) counts as the client leaving.
        if self.out.write_all(chunk.as_bytes()).await.is_err() || self.out.flush().await.is_err()
        {
            self.open = false;
            return Err(SinkClosed);
        }
        Ok(())
    }

    async fn close_with_error(&mut self, reason: &str) {
        self.open = false;
        let _ = self.out.write_all(b"\n").await;
        let _ = self.out.flush().await;
        eprintln!("  [Error] {reason}");
    }
}

pub async fn run(question: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let service = TravelGuideService::from_config(&config)?;

    let mut sink = WriterSink::new(tokio::io::stdout());
    let outcome = service.stream_chat(&question, &mut sink).await?;
    if let RelayOutcome::Completed { .. } = outcome {
        println!();
    }
    tracing::debug!(chunks = outcome.chunks(), "Chat answer finished");

    Ok(())
}
