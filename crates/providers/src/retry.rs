//! Retry budget for LLM calls: bounded attempts with per-attempt timeouts.
//!
//! A call is attempted once plus `max_retries` more times. Only transient
//! failures (network, timeout, rate limit, 408/5xx) are retried; anything
//! else ends the loop immediately.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};
use travelguide_core::error::{GuideError, ProviderError};

/// Longest single backoff between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    /// Delay before the first retry; doubles for each further retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            initial_backoff: Duration::from_secs(1),
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Run `attempt` until it succeeds, fails permanently, or the budget is
    /// spent.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let error = match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => {
                    if attempts > 1 {
                        info!(operation, attempts, "LLM call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "{operation} timed out after {}s",
                    self.attempt_timeout.as_secs()
                )),
            };

            if !error.is_transient() || attempts >= max_attempts {
                warn!(operation, attempts, error = %error, "LLM call failed, giving up");
                return Err(RetryExhausted {
                    attempts,
                    last_error: error,
                });
            }

            let mut delay = self.backoff_for(attempts);
            if let ProviderError::RateLimited { retry_after_secs } = error {
                delay = delay.max(Duration::from_secs(retry_after_secs)).min(MAX_BACKOFF);
            }

            warn!(
                operation,
                attempt = attempts,
                max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "LLM call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// The error left over once a [`RetryPolicy`] stops trying.
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: ProviderError,
}

impl From<RetryExhausted> for GuideError {
    fn from(e: RetryExhausted) -> Self {
        GuideError::UpstreamUnavailable {
            attempts: e.attempts,
            reason: e.last_error.to_string(),
        }
    }
}
