//! Error taxonomy for search operations.

use crate::http_client::HttpError;

/// Errors from searching.
///
/// Only [`SearchError::Config`] escapes [`super::SearchClient::search`];
/// every other variant ends pagination and is reported through
/// [`super::StopReason::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid search parameters: {0}")]
    Config(String),
    #[error("Still rate limited (HTTP 429) after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Malformed(e.to_string())
    }
}

impl SearchError {
    /// True for failures of a page fetch (everything but bad parameters).
    pub fn is_transport(&self) -> bool {
        !matches!(self, SearchError::Config(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Transport(HttpError::Timeout(_)))
    }
}
