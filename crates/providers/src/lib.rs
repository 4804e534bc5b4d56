//! LLM provider implementations for TravelGuide.
//!
//! All providers implement the `travelguide_core::Provider` trait.
//! [`LlmGateway`] pairs a provider with an immutable model profile and a
//! retry budget; the service builds one gateway per use case at startup.

pub mod gateway;
pub mod openai_compat;
pub mod retry;

pub use gateway::{ChunkStream, LlmGateway};
pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryExhausted, RetryPolicy};
