//! tedquire - procurement notice retrieval from the TED search API.
//!
//! Paginated expert-query search with client-side pacing, 429-aware
//! retries and partial-result reporting, plus export and per-notice
//! document download.

pub mod cli;
pub mod config;
pub mod documents;
pub mod export;
pub mod http_client;
pub mod query;
pub mod rate_limit;
pub mod search;

pub use search::{
    Record, RecordFilter, SearchClient, SearchError, SearchOutcome, SearchRequest, StopReason,
};
