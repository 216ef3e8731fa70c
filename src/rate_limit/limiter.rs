//! Process-wide request throttle.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::backend::{BoxedRateLimitBackend, ThrottleStats};
use super::memory::InMemoryRateLimitBackend;

/// Minimum spacing between API requests (~3 requests per second).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(300);

/// Enforces a minimum interval between requests across every clone.
///
/// Pass one limiter (or its clones) to everything that talks to the same
/// endpoint; the budget belongs to the endpoint, not to a single search.
#[derive(Clone)]
pub struct RateLimiter {
    backend: BoxedRateLimitBackend,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter backed by a fresh in-memory clock.
    pub fn new(min_interval: Duration) -> Self {
        Self::with_backend(Arc::new(InMemoryRateLimitBackend::new()), min_interval)
    }

    /// Create a limiter over an existing backend.
    pub fn with_backend(backend: BoxedRateLimitBackend, min_interval: Duration) -> Self {
        Self {
            backend,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until `min_interval` has passed since the previous request
    /// anywhere in the process, then claim the slot. Never fails.
    pub async fn throttle(&self) {
        let wait = self.backend.acquire(self.min_interval).await;
        if wait > Duration::ZERO {
            debug!("Throttling request for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    pub async fn stats(&self) -> ThrottleStats {
        self.backend.stats().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
