//! # TravelGuide Core
//!
//! Domain types, traits, and error definitions for the TravelGuide service.
//! This crate has **no framework dependencies**: it defines the query and
//! guide documents, the budget tiers, and the provider abstraction that the
//! other crates implement against.
//!
//! Everything here is either a plain value type or a pure function, so it is
//! safe to share across concurrently handled requests.

pub mod budget;
pub mod error;
pub mod guide;
pub mod message;
pub mod provider;
pub mod query;

// Re-export key types at crate root for ergonomics
pub use budget::{BudgetTier, TierDescription, classify};
pub use error::{Error, GuideError, ProviderError};
pub use guide::{
    AccommodationItem, AttractionItem, ImageItem, ItineraryDay, TravelGuideDocument,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use query::{DateRange, TravelQuery};
