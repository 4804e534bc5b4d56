//! The guide pipeline: from a travel query to a validated document.
//!
//! Two paths share the same gateways:
//!
//! 1. **Structured guide**: classify the budget, render the tier-aware
//!    prompt with the output schema, invoke the model, reconcile the raw
//!    text into a [`TravelGuideDocument`](travelguide_core::TravelGuideDocument).
//! 2. **Travel chat**: render the Markdown chat prompt, open a stream, and
//!    relay chunks to a live sink as they arrive.
//!
//! Prompt building and reconciliation are pure; only the gateway suspends.

pub mod prompt;
pub mod reconcile;
pub mod relay;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use prompt::{Prompt, build_chat_prompt, build_guide_prompt, guide_output_schema};
pub use reconcile::reconcile;
pub use relay::{ChunkSink, RelayOutcome, SinkClosed, relay};
pub use service::TravelGuideService;
