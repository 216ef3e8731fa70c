//! In-memory rate limit backend for single-process operation.
//!
//! State is not persisted across restarts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::backend::{RateLimitBackend, ThrottleStats};

#[derive(Debug, Default)]
struct ClockState {
    last_request: Option<Instant>,
    stats: ThrottleStats,
}

/// In-memory rate limit backend.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitBackend {
    state: Arc<Mutex<ClockState>>,
}

impl InMemoryRateLimitBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitBackend for InMemoryRateLimitBackend {
    async fn acquire(&self, min_interval: Duration) -> Duration {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let wait = state
            .last_request
            .map(|last| (last + min_interval).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO);

        // Record the slot as taken at the moment the caller will actually send.
        state.last_request = Some(now + wait);
        state.stats.total_requests += 1;
        state.stats.total_wait += wait;

        wait
    }

    async fn stats(&self) -> ThrottleStats {
        self.state.lock().await.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let backend = InMemoryRateLimitBackend::new();
        let wait = backend.acquire(Duration::from_millis(300)).await;
        assert_eq!(wait, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_acquire_waits_full_interval() {
        let backend = InMemoryRateLimitBackend::new();
        backend.acquire(Duration::from_millis(300)).await;
        let wait = backend.acquire(Duration::from_millis(300)).await;
        assert_eq!(wait, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_interval() {
        let backend = InMemoryRateLimitBackend::new();
        backend.acquire(Duration::from_millis(300)).await;
        tokio::time::advance(Duration::from_millis(200)).await;
        let wait = backend.acquire(Duration::from_millis(300)).await;
        assert_eq!(wait, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_callers_get_staggered_slots() {
        let backend = InMemoryRateLimitBackend::new();
        let interval = Duration::from_millis(300);
        let waits = vec![
            backend.acquire(interval).await,
            backend.acquire(interval).await,
            backend.acquire(interval).await,
        ];
        assert_eq!(
            waits,
            vec![
                Duration::ZERO,
                Duration::from_millis(300),
                Duration::from_millis(600)
            ]
        );

        let stats = backend.stats().await;
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.total_wait, Duration::from_millis(900));
    }
}
