//! Minimum-interval rate limiter shared by every catalog call.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Serializes outbound requests so that two of them never start closer
/// together than `min_interval`.
///
/// The lock is held across the wait, so wait-then-stamp is atomic even with
/// concurrent callers. Clones share the same timestamp.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until the interval since the previous call has elapsed, then
    /// stamp the current instant.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Catalog rate limit: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
