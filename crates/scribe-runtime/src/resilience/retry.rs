//! Retry with exponential backoff for transient provider errors.
//!
//! Policy: up to `max_attempts` total calls, delays doubling from
//! `min_delay` and capped at `max_delay`. Only transient errors are
//! retried; permanent and not-configured errors abort on the first
//! occurrence.

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;

use crate::config::RetryConfig;
use crate::providers::ProviderError;

/// Run a provider operation under the retry policy.
pub async fn with_retry<T, F, Fut>(retry: &RetryConfig, operation: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(retry.min_delay)
        .with_max_delay(retry.max_delay)
        .with_factor(2.0)
        // max_times counts retries after the first attempt
        .with_max_times(retry.max_attempts.saturating_sub(1) as usize);

    operation
        .retry(backoff)
        .when(ProviderError::is_transient)
        .notify(|error, delay| {
            tracing::warn!(%error, ?delay, "transient provider error, retrying");
        })
        .await
}
