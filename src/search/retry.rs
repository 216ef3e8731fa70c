//! 429-aware retry around a single HTTP attempt.
//!
//! The policy is a small state machine so the retry cap and backoff growth
//! can be checked without a network:
//!
//! ```text
//! Attempting --429, attempts < max--> Backoff --sleep--> Attempting
//! Attempting --429, attempts == max--> Exhausted
//! Attempting --anything else--------> Done
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::SearchError;
use crate::http_client::{HttpError, HttpResponse};
use crate::rate_limit::{backoff_delay, parse_retry_after, RateLimiter};

/// Retry settings for rate-limited responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait after the first 429 when no `Retry-After` is given.
    pub initial_backoff: Duration,
    /// Ceiling for the doubled backoff.
    pub max_backoff: Duration,
    /// Rate-limited attempts tolerated before giving up, the first included.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            max_retries: 5,
        }
    }
}

/// Retry state. `R` is the response type carried to `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState<R> {
    /// Ready to send; `retries` attempts have already been rate limited.
    Attempting { retries: u32 },
    /// Sleeping `wait` before attempt number `retries + 2`.
    Backoff { retries: u32, wait: Duration },
    /// Every one of `attempts` sends was rate limited.
    Exhausted { attempts: u32 },
    /// A non-429 response arrived.
    Done { retries: u32, response: R },
}

impl RetryPolicy {
    pub fn start<R>(&self) -> RetryState<R> {
        RetryState::Attempting { retries: 0 }
    }

    /// Current backoff after `retries` retries.
    pub fn backoff(&self, retries: u32) -> Duration {
        backoff_delay(retries, self.initial_backoff, self.max_backoff)
    }

    /// Transition out of `Attempting { retries }` given the attempt's result.
    /// `retry_after` overrides the backoff for this wait only.
    pub fn on_response<R>(
        &self,
        retries: u32,
        response: R,
        rate_limited: bool,
        retry_after: Option<Duration>,
    ) -> RetryState<R> {
        if !rate_limited {
            RetryState::Done { retries, response }
        } else if retries + 1 >= self.max_retries {
            RetryState::Exhausted {
                attempts: retries + 1,
            }
        } else {
            RetryState::Backoff {
                retries,
                wait: retry_after.unwrap_or_else(|| self.backoff(retries)),
            }
        }
    }

    /// Transition out of `Backoff { retries, .. }`.
    pub fn after_backoff<R>(&self, retries: u32) -> RetryState<R> {
        RetryState::Attempting {
            retries: retries + 1,
        }
    }
}

/// Runs attempts through the rate limiter and the retry policy.
#[derive(Clone)]
pub struct RetryController {
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self { limiter, policy }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Throttle, send, and repeat on HTTP 429 until a different status
    /// arrives or the retry cap is hit.
    ///
    /// Non-429 error statuses are returned as `Ok`; judging them is the
    /// caller's job. Transport failures are returned immediately, unretried.
    pub async fn attempt<F, Fut>(&self, mut request: F) -> Result<HttpResponse, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, HttpError>>,
    {
        let mut state = self.policy.start();
        loop {
            state = match state {
                RetryState::Attempting { retries } => {
                    self.limiter.throttle().await;
                    debug!("Sending request (attempt {})", retries + 1);
                    let response = request().await?;
                    let rate_limited = response.is_rate_limited();
                    let retry_after = parse_retry_after(response.retry_after());
                    self.policy
                        .on_response(retries, response, rate_limited, retry_after)
                }
                RetryState::Backoff { retries, wait } => {
                    warn!(
                        "Received 429 Too Many Requests, sleeping {:?} before attempt {}/{}",
                        wait,
                        retries + 2,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(wait).await;
                    self.policy.after_backoff(retries)
                }
                RetryState::Exhausted { attempts } => {
                    warn!("Giving up after {} rate-limited attempts", attempts);
                    return Err(SearchError::RateLimited { attempts });
                }
                RetryState::Done { response, .. } => return Ok(response),
            };
        }
    }
}
