//! Error types for the TravelGuide domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` ties them together.

use thiserror::Error;

/// The top-level error type for all TravelGuide operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Guide pipeline errors ---
    #[error(transparent)]
    Guide(#[from] GuideError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// --- Bounded context errors ---

/// Transport-level failures talking to an LLM backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt against the same backend could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => {
                matches!(status_code, 408 | 500 | 502 | 503 | 504)
            }
            Self::AuthenticationFailed(_) | Self::StreamInterrupted(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

/// Failures of the guide pipeline: classification, gateway, reconciliation
/// and streaming.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuideError {
    #[error("Budget must be at least ${minimum}, got {budget}")]
    InvalidBudget { budget: f64, minimum: f64 },

    #[error("Invalid travel query: {0}")]
    InvalidQuery(String),

    #[error("LLM backend unavailable after {attempts} attempt(s): {reason}")]
    UpstreamUnavailable { attempts: u32, reason: String },

    #[error("Invalid JSON output: {reason} (raw output starts with: {excerpt:?})")]
    MalformedOutput { reason: String, excerpt: String },

    #[error("Output does not match the travel guide schema: {0}")]
    SchemaViolation(String),

    #[error("LLM stream failed: {0}")]
    StreamingUpstreamError(String),
}

impl GuideError {
    /// Stable machine-readable name, used in HTTP error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBudget { .. } => "invalid_budget",
            Self::InvalidQuery(_) => "invalid_query",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::MalformedOutput { .. } => "malformed_output",
            Self::SchemaViolation(_) => "schema_violation",
            Self::StreamingUpstreamError(_) => "streaming_upstream_error",
        }
    }

    /// Caller-side input problems, rejected before any LLM call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidBudget { .. } | Self::InvalidQuery(_))
    }
}
