//! LLM gateway: one provider, one immutable model profile, one retry budget.
//!
//! Two gateways exist per process (structured guides and chat). They are
//! created at startup, shared via `Arc`, and never mutated; each call only
//! supplies its own prompt messages.

use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use travelguide_config::{AppConfig, ModelProfile};
use travelguide_core::error::{Error, GuideError};
use travelguide_core::message::Message;
use travelguide_core::provider::{ChunkReceiver, Provider, ProviderRequest};

use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryPolicy;

/// Lazy, finite, non-restartable sequence of text chunks in emission order.
///
/// Dropping it releases the upstream streaming response.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, GuideError>> + Send>>;

pub struct LlmGateway {
    provider: Arc<dyn Provider>,
    profile: ModelProfile,
    retry: RetryPolicy,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn Provider>, profile: ModelProfile) -> Self {
        let retry = RetryPolicy::new(profile.max_retries, profile.timeout());
        Self {
            provider,
            profile,
            retry,
        }
    }

    /// Build a gateway for `profile` against an OpenAI-compatible backend.
    pub fn from_config(config: &AppConfig, profile: &ModelProfile) -> Result<Self, Error> {
        let backend = config.resolve(profile).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        let provider =
            OpenAiCompatProvider::new(&backend.provider, &backend.base_url, &backend.api_key)?;

        info!(
            provider = %backend.provider,
            base_url = %backend.base_url,
            model = %profile.model,
            temperature = profile.temperature,
            max_retries = profile.max_retries,
            "LLM gateway ready"
        );

        Ok(Self::new(Arc::new(provider), profile.clone()))
    }

    /// Replace the retry policy (tests use a zero backoff).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.profile.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, messages: &[Message], stream: bool) -> ProviderRequest {
        ProviderRequest {
            model: self.profile.model.clone(),
            messages: messages.to_vec(),
            temperature: self.profile.temperature,
            max_tokens: self.profile.max_tokens,
            stream,
        }
    }

    /// Blocking invocation: the full completion text once the model is done.
    pub async fn invoke(&self, messages: &[Message]) -> Result<String, GuideError> {
        let request = self.request(messages, false);
        let provider = &self.provider;

        let response = self
            .retry
            .run("complete", || provider.complete(request.clone()))
            .await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }

        Ok(response.message.content)
    }

    /// Streaming invocation. Opening the stream is retried like `invoke`;
    /// a failure after the first chunk is yielded as
    /// [`GuideError::StreamingUpstreamError`] and ends the stream. So is a
    /// gap between chunks longer than the profile timeout.
    pub async fn stream_invoke(&self, messages: &[Message]) -> Result<ChunkStream, GuideError> {
        let request = self.request(messages, true);
        let provider = &self.provider;

        let rx = self
            .retry
            .run("stream", || provider.stream(request.clone()))
            .await?;

        Ok(into_chunk_stream(rx, self.profile.timeout()))
    }

    /// Health of the underlying backend, bounded by one attempt timeout.
    pub async fn health_check(&self) -> bool {
        let check = self.provider.health_check();
        matches!(
            tokio::time::timeout(self.retry.attempt_timeout.min(Duration::from_secs(10)), check)
                .await,
            Ok(Ok(true))
        )
    }
}

/// Adapt a provider channel into a text stream that ends at the done marker.
///
/// Waiting longer than `idle` for the next item fails the stream, and the
/// receiver is dropped so the provider stops reading.
fn into_chunk_stream(rx: ChunkReceiver, idle: Duration) -> ChunkStream {
    let stream = futures::stream::unfold(Some(rx), move |state| async move {
        let Some(mut rx) = state else {
            return None;
        };
        loop {
            let Ok(next) = tokio::time::timeout(idle, rx.recv()).await else {
                warn!(idle_secs = idle.as_secs(), "Upstream stream stalled");
                let err = GuideError::StreamingUpstreamError(format!(
                    "no output from the model for {}s",
                    idle.as_secs()
                ));
                return Some((Err(err), None));
            };
            match next {
                None => return None,
                Some(Ok(chunk)) if chunk.done => {
                    if let Some(usage) = chunk.usage {
                        debug!(
                            completion_tokens = usage.completion_tokens,
                            "Stream finished"
                        );
                    }
                    return None;
                }
                Some(Ok(chunk)) => match chunk.content {
                    Some(text) if !text.is_empty() => return Some((Ok(text), Some(rx))),
                    _ => continue,
                },
                Some(Err(e)) => {
                    let err = GuideError::StreamingUpstreamError(e.to_string());
                    return Some((Err(err), None));
                }
            }
        }
    });
    Box::pin(stream)
}
