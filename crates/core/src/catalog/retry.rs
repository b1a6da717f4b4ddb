//! Exponential backoff for transient catalog failures.

use std::future::Future;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;

use super::{CatalogError, RateLimiter};

/// Run `operation` behind the rate limiter, retrying transient failures.
///
/// The limiter is re-acquired before every attempt, including retries.
/// Permanent errors are returned immediately; once retries are exhausted the
/// last error seen is returned.
pub async fn with_retry<T, F, Fut>(
    limiter: &RateLimiter,
    policy: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0;

    loop {
        limiter.acquire().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient catalog failure, retrying"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
