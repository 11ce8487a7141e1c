//! Retry with exponential backoff.
//!
//! Transient chain failures are retried at most [`RetryConfig::max_retries`]
//! times (default 1); everything else surfaces immediately.

use std::time::Duration;

use crate::error::ChainError;

/// Backoff parameters.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Multiplier per attempt.
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_factor: 2,
        }
    }
}

/// delay = `initial_delay` × (`backoff_factor` ^ `attempt`), capped.
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    config
        .initial_delay
        .checked_mul(config.backoff_factor.saturating_pow(attempt))
        .unwrap_or(config.max_delay)
        .min(config.max_delay)
}

/// Retry an async chain operation on transient errors.
///
/// # Errors
/// The final error once retries are exhausted, or immediately for
/// non-transient kinds.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && e.is_retryable() => {
                let delay = backoff_delay(config, attempt);
                tracing::debug!(attempt, ?delay, "retrying transient chain failure");
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    }
}
