//! Runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::documents::DEFAULT_DOWNLOAD_INTERVAL;
use crate::http_client::USER_AGENT;
use crate::search::{RetryPolicy, DEFAULT_FIELDS, DEFAULT_PAGE_SIZE, SEARCH_PATH};

/// Public TED API.
pub const DEFAULT_BASE_URL: &str = "https://api.ted.europa.eu";

/// Default PDF language.
pub const DEFAULT_LANGUAGE: &str = "DEU";

/// Resolved runtime values.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API base URL; the search path is appended to it.
    pub base_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Minimum spacing between API requests in milliseconds.
    pub min_interval_ms: u64,
    pub page_size: u32,
    pub fields: Vec<String>,
    /// PDF language for filtering and downloads.
    pub language: String,
    /// Directory for exports and downloads.
    pub output_dir: PathBuf,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub max_retries: u32,
    /// Spacing between artifact downloads in milliseconds.
    pub download_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            request_timeout: 30,
            min_interval_ms: 300,
            page_size: DEFAULT_PAGE_SIZE,
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            language: DEFAULT_LANGUAGE.to_string(),
            output_dir: PathBuf::from("."),
            initial_backoff_secs: retry.initial_backoff.as_secs(),
            max_backoff_secs: retry.max_backoff.as_secs(),
            max_retries: retry.max_retries,
            download_interval_ms: DEFAULT_DOWNLOAD_INTERVAL.as_millis() as u64,
        }
    }
}

impl Settings {
    /// Full URL of the search endpoint.
    pub fn search_url(&self) -> Result<String, String> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid API base URL '{}': {}", self.base_url, e))?;
        base.join(SEARCH_PATH)
            .map(String::from)
            .map_err(|e| format!("Invalid API base URL '{}': {}", self.base_url, e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn download_interval(&self) -> Duration {
        Duration::from_millis(self.download_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_secs(self.initial_backoff_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            max_retries: self.max_retries,
        }
    }
}
