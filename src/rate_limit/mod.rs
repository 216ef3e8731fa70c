//! Request pacing for the search API.
//!
//! The remote endpoint enforces a global request-rate ceiling, so every
//! caller in the process shares one [`RateLimiter`] (clones share state).
//! Backends are pluggable; the in-memory backend keeps the single
//! "last request" instant for the lifetime of the process.

mod backend;
mod limiter;
mod memory;

pub use backend::{BoxedRateLimitBackend, RateLimitBackend, ThrottleStats};
pub use limiter::{RateLimiter, DEFAULT_MIN_INTERVAL};
pub use memory::InMemoryRateLimitBackend;

use std::time::Duration;

/// Parse a `Retry-After` header value given in whole seconds.
/// Returns `None` if the header is missing or not an integer.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Exponential backoff for the given zero-based retry index, capped at `max`.
pub fn backoff_delay(retry: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(retry);
    base.saturating_mul(factor).min(max)
}
