//! `GET /ws/travel-chat`: streamed travel answers over WebSocket.
//!
//! Protocol:
//! - Client → Server: one text frame per question
//! - Server → Client: Markdown text frames, in order, as the model emits them
//!
//! The connection stays open for further questions. An upstream failure
//! ends it with a close frame carrying code 1011.

use async_trait::async_trait;
use axum::{
    extract::State,
    extract::ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade, close_code},
    response::IntoResponse,
};
use futures::{Sink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};
use travelguide_planner::{ChunkSink, RelayOutcome, SinkClosed};
use uuid::Uuid;

use crate::SharedState;

/// Questions a client may queue while an answer is still streaming.
const QUESTION_BUFFER: usize = 8;

/// Close reasons must fit in a control frame.
const MAX_CLOSE_REASON_BYTES: usize = 120;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state))
}

async fn handle_chat_socket(socket: WebSocket, state: SharedState) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "WebSocket connection established");

    let (sender, mut receiver) = socket.split();
    let open = Arc::new(watch::channel(true).0);
    let (question_tx, mut question_rx) = mpsc::channel::<String>(QUESTION_BUFFER);

    // The reader owns the receiving half so a disconnect is noticed while
    // an answer is still streaming.
    let reader_open = open.clone();
    let reader = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => {
                    if question_tx.send(text.to_string()).await.is_err() {
                        break;
                    }
                }
                Ok(WsMessage::Close(_)) | Err(_) => break,
                Ok(_) => continue, // ignore binary, ping, pong
            }
        }
        reader_open.send_replace(false);
    });

    let mut sink = WsChunkSink::new(sender, open);

    while let Some(question) = question_rx.recv().await {
        if !sink.is_open() {
            break;
        }
        if question.trim().is_empty() {
            debug!(%connection_id, "Ignoring empty question");
            continue;
        }

        info!(%connection_id, question_len = question.len(), "Received chat question");
        match state.service.stream_chat(&question, &mut sink).await {
            Ok(RelayOutcome::Completed { chunks }) => {
                debug!(%connection_id, chunks, "Answer delivered");
            }
            Ok(RelayOutcome::ClientDisconnected { chunks }) => {
                info!(%connection_id, chunks, "Client left mid-answer");
                break;
            }
            Err(e) => {
                error!(%connection_id, kind = e.kind(), error = %e, "Error in WebSocket chat");
                break;
            }
        }
    }

    reader.abort();
    info!(%connection_id, "WebSocket connection closed");
}

/// [`ChunkSink`] over the sending half of a WebSocket.
///
/// Liveness is shared with the task reading the other half, which clears
/// it when the client closes or the socket errors.
pub struct WsChunkSink<S> {
    sender: S,
    open: Arc<watch::Sender<bool>>,
}

impl<S> WsChunkSink<S> {
    pub fn new(sender: S, open: Arc<watch::Sender<bool>>) -> Self {
        Self { sender, open }
    }

    fn mark_closed(&self) {
        self.open.send_replace(false);
    }
}

#[async_trait]
impl<S> ChunkSink for WsChunkSink<S>
where
    S: Sink<WsMessage> + Unpin + Send,
{
    fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    async fn send_chunk(&mut self, chunk: &str) -> Result<(), SinkClosed> {
        if !self.is_open() {
            return Err(SinkClosed);
        }
        if self.sender.send(WsMessage::Text(chunk.into())).await.is_err() {
            self.mark_closed();
            return Err(SinkClosed);
        }
        Ok(())
    }

    async fn close_with_error(&mut self, reason: &str) {
        if !self.is_open() {
            return;
        }
        self.mark_closed();
        let frame = CloseFrame {
            code: close_code::ERROR,
            reason: truncate_reason(reason).into(),
        };
        let _ = self.sender.send(WsMessage::Close(Some(frame))).await;
    }

    async fn closed(&mut self) {
        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| !*open).await;
    }
}

fn truncate_reason(reason: &str) -> String {
    let mut out = String::new();
    for c in reason.chars() {
        if out.len() + c.len_utf8() > MAX_CLOSE_REASON_BYTES {
            break;
        }
        out.push(c);
    }
    out
}
