use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use travelguide_config::AppConfig;
use travelguide_core::budget::classify;
use travelguide_core::error::{Error, GuideError};
use travelguide_core::guide::TravelGuideDocument;
use travelguide_core::query::TravelQuery;
use travelguide_providers::LlmGateway;

use crate::prompt::{build_chat_prompt, build_guide_prompt, guide_output_schema};
use crate::reconcile::reconcile;
use crate::relay::{ChunkSink, RelayOutcome, relay};

/// Orchestrates both pipelines over a pair of long-lived gateways.
///
/// Holds no per-request state, so one instance serves all concurrent
/// requests.
pub struct TravelGuideService {
    guide: Arc<LlmGateway>,
    chat: Arc<LlmGateway>,
    schema: Value,
}

impl TravelGuideService {
    pub fn new(guide: Arc<LlmGateway>, chat: Arc<LlmGateway>) -> Self {
        Self {
            guide,
            chat,
            schema: guide_output_schema(),
        }
    }

    /// Build both gateways from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let guide = LlmGateway::from_config(config, &config.guide)?;
        let chat = LlmGateway::from_config(config, &config.chat)?;
        Ok(Self::new(Arc::new(guide), Arc::new(chat)))
    }

    pub fn guide_gateway(&self) -> &LlmGateway {
        &self.guide
    }

    pub fn chat_gateway(&self) -> &LlmGateway {
        &self.chat
    }

    /// Classify, prompt, invoke, reconcile.
    ///
    /// An invalid budget is rejected before any LLM call is made.
    pub async fn generate_guide(
        &self,
        query: &TravelQuery,
    ) -> Result<TravelGuideDocument, GuideError> {
        let (tier, description) = classify(query.budget)?;

        info!(
            destinations = %query.destinations,
            start_date = %query.dates.start_date,
            end_date = %query.dates.end_date,
            budget = query.budget,
            tier = %tier,
            model = %self.guide.model(),
            "Generating travel guide"
        );

        let prompt = build_guide_prompt(query, tier, description, &self.schema);
        let raw = self.guide.invoke(&prompt.to_messages()).await?;

        match reconcile(&raw) {
            Ok(document) => {
                info!(
                    days = document.itinerary.len(),
                    accommodations = document.accommodation_count(),
                    "Travel guide ready"
                );
                Ok(document)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Model output rejected");
                Err(e)
            }
        }
    }

    /// Answer a travel question by streaming Markdown chunks into `sink`.
    ///
    /// If the stream cannot be opened, the sink is closed with the error
    /// before it is returned.
    pub async fn stream_chat<K>(
        &self,
        question: &str,
        sink: &mut K,
    ) -> Result<RelayOutcome, GuideError>
    where
        K: ChunkSink + ?Sized,
    {
        let question = question.trim();
        if question.is_empty() {
            let err = GuideError::InvalidQuery("question must not be empty".into());
            sink.close_with_error(&err.to_string()).await;
            return Err(err);
        }

        let prompt = build_chat_prompt(question);
        let stream = match self.chat.stream_invoke(&prompt.to_messages()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Could not open chat stream");
                sink.close_with_error(&e.to_string()).await;
                return Err(e);
            }
        };

        let outcome = relay(stream, sink).await?;
        info!(chunks = outcome.chunks(), ?outcome, "Chat relay finished");
        Ok(outcome)
    }
}
