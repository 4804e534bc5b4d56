//! OpenAI-compatible provider implementation.
//!
//! Works with: Groq, Ollama (`/v1`), OpenAI, vLLM, Together AI, and any
//! endpoint exposing `/chat/completions`.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Health checks via `/models`

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use travelguide_core::error::ProviderError;
use travelguide_core::message::{Message, Role};
use travelguide_core::provider::*;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// Only the connect phase has a client-level timeout; whole-request
    /// deadlines are applied per attempt by the gateway so long streams are
    /// not cut off.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Send a chat completion request and map non-200 statuses to errors.
    async fn post_completion(
        &self,
        body: &serde_json::Value,
        streaming: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if streaming {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder.json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl travelguide_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = Self::request_body(&request, false);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self.post_completion(&body, false).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message {
                role: Role::Assistant,
                content: choice.message.content.unwrap_or_default(),
            },
            usage,
            model: api_response.model,
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let mut body = Self::request_body(&request, true);
        body["stream_options"] = serde_json::json!({ "include_usage": true });

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self.post_completion(&body, true).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Read the SSE byte stream and forward deltas in arrival order.
        // Returning drops `response`, which releases the upstream connection.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            // Raw bytes: a UTF-8 sequence may straddle two network chunks.
            let mut buffer: Vec<u8> = Vec::new();

            loop {
                let next = tokio::select! {
                    next = byte_stream.next() => next,
                    _ = tx.closed() => {
                        debug!(provider = %provider_name, "Stream receiver dropped");
                        return;
                    }
                };
                let Some(chunk_result) = next else {
                    break;
                };
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);

                while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    if forward_sse_line(&line[..line_end], &tx, &provider_name).await
                        == Forward::Stop
                    {
                        return;
                    }
                }
            }

            // A last event without a trailing newline
            if !buffer.is_empty()
                && forward_sse_line(&buffer, &tx, &provider_name).await == Forward::Stop
            {
                return;
            }

            // Stream ended without [DONE]
            let _ = tx.send(Ok(StreamChunk::done(None))).await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Whether the reader task keeps going after a line.
#[derive(Debug, PartialEq, Eq)]
enum Forward {
    Continue,
    Stop,
}

/// Classify one raw SSE line and push whatever it carries to the receiver.
async fn forward_sse_line(
    raw: &[u8],
    tx: &tokio::sync::mpsc::Sender<Result<StreamChunk, ProviderError>>,
    provider_name: &str,
) -> Forward {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim_end_matches('\r'),
        Err(e) => {
            trace!(provider = %provider_name, error = %e, "Ignoring non-UTF-8 SSE line");
            return Forward::Continue;
        }
    };

    match parse_sse_line(line) {
        SseLine::Skip => Forward::Continue,
        SseLine::Done => {
            let _ = tx.send(Ok(StreamChunk::done(None))).await;
            Forward::Stop
        }
        SseLine::Invalid(data, e) => {
            trace!(
                provider = %provider_name,
                data = %data,
                error = %e,
                "Ignoring unparseable SSE chunk"
            );
            Forward::Continue
        }
        SseLine::Data(stream_resp) => {
            let content = stream_resp
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .filter(|c| !c.is_empty());

            if let Some(content) = content {
                if tx.send(Ok(StreamChunk::text(content))).await.is_err() {
                    debug!(provider = %provider_name, "Stream receiver dropped");
                    return Forward::Stop;
                }
            }

            if let Some(usage) = stream_resp.usage {
                let usage = Usage {
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                };
                let _ = tx.send(Ok(StreamChunk::done(Some(usage)))).await;
                return Forward::Stop;
            }
            Forward::Continue
        }
    }
}

/// One classified line of an SSE body.
enum SseLine {
    /// Blank line, comment, or non-data field
    Skip,
    /// `data: [DONE]`
    Done,
    Data(StreamResponse),
    Invalid(String, serde_json::Error),
}

fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamResponse>(data) {
        Ok(resp) => SseLine::Data(resp),
        Err(e) => SseLine::Invalid(data.to_string(), e),
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
