//! Pluggable backend trait for the shared request clock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Type alias for a shared rate limit backend.
pub type BoxedRateLimitBackend = Arc<dyn RateLimitBackend>;

/// Counters reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Number of request slots handed out.
    pub total_requests: u64,
    /// Sum of all waits imposed on callers.
    pub total_wait: Duration,
}

/// Storage for the "time of last request" cell.
///
/// Implementations must be safe under concurrent callers: `acquire` reserves
/// the next slot atomically, so two callers never receive the same slot.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Reserve the next request slot at least `min_interval` after the
    /// previous one. Returns how long the caller must wait before sending.
    async fn acquire(&self, min_interval: Duration) -> Duration;

    /// Counters since the backend was created.
    async fn stats(&self) -> ThrottleStats;
}
