//! Paginated notice search.
//!
//! [`SearchClient::search`] walks result pages one request at a time. Every
//! request goes through the shared [`RateLimiter`](crate::rate_limit::RateLimiter)
//! and the 429-aware [`RetryController`]. Records are filtered per page with a
//! [`RecordFilter`] before they count toward the record cap.

mod client;
mod error;
mod filter;
mod retry;
mod types;

pub use client::SearchClient;
pub use error::SearchError;
pub use filter::{RecordFilter, PDF_LINKS};
pub use retry::{RetryController, RetryPolicy, RetryState};
pub use types::{
    Record, SearchOutcome, SearchPage, SearchRequest, StopReason, DEFAULT_FIELDS,
    DEFAULT_PAGE_SIZE, PUBLICATION_NUMBER,
};

/// Path of the notice search endpoint, relative to the API base URL.
pub const SEARCH_PATH: &str = "/v3/notices/search";
