//! Request, record and outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::SearchError;
use super::filter::RecordFilter;

/// Fields requested when the caller does not name any.
pub const DEFAULT_FIELDS: &[&str] = &["publication-date"];

/// Default results per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Field holding a notice's identifier.
pub const PUBLICATION_NUMBER: &str = "publication-number";

/// One notice as returned by the API.
///
/// The shape is defined by the API and the requested fields, so only the
/// keys this crate reads have accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The `publication-number` identifier, if present as a string.
    pub fn publication_number(&self) -> Option<&str> {
        self.get(PUBLICATION_NUMBER).and_then(Value::as_str)
    }

    /// URL at `links.<kind>.<language>`, e.g. `links.pdf.DEU`.
    /// Missing keys, non-strings and empty strings all yield `None`.
    pub fn link(&self, kind: &str, language: &str) -> Option<&str> {
        self.get("links")?
            .get(kind)?
            .get(language)?
            .as_str()
            .filter(|url| !url.is_empty())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A single logical search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Expert-syntax query, passed through untouched.
    pub query: String,
    /// Requested fields; empty means [`DEFAULT_FIELDS`].
    pub fields: Vec<String>,
    /// First page to fetch (1-based).
    pub page: u32,
    /// Records per page request.
    pub page_size: u32,
    /// Total record cap; `None` means `page_size`.
    pub limit: Option<usize>,
    /// Pages to fetch counting from `page`.
    pub max_pages: Option<u32>,
    pub filter: RecordFilter,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            limit: None,
            max_pages: None,
            filter: RecordFilter::All,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Reject parameters that can never produce a valid request.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page == 0 {
            return Err(SearchError::Config("page must be >= 1".to_string()));
        }
        if self.page_size == 0 {
            return Err(SearchError::Config("page size must be >= 1".to_string()));
        }
        if self.max_pages == Some(0) {
            return Err(SearchError::Config("max pages must be >= 1".to_string()));
        }
        if self.limit == Some(0) {
            return Err(SearchError::Config("limit must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Maximum number of records the search may return.
    pub fn record_cap(&self) -> usize {
        self.limit.unwrap_or(self.page_size as usize)
    }

    /// Requested fields with the default applied.
    pub fn effective_fields(&self) -> Vec<String> {
        if self.fields.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            self.fields.clone()
        }
    }

    /// Highest page index allowed by `max_pages`.
    pub(crate) fn last_page_allowed(&self) -> Option<u64> {
        self.max_pages
            .map(|max| u64::from(max) + u64::from(self.page) - 1)
    }

    /// JSON body for one page request; the wire `limit` is the page size.
    pub(crate) fn page_body(&self, page: u64) -> Value {
        json!({
            "query": self.query,
            "fields": self.effective_fields(),
            "page": page,
            "limit": self.page_size,
        })
    }
}

/// Search endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "totalNotices", default)]
    total_notices: Option<u64>,
    #[serde(default)]
    notices: Option<Vec<Record>>,
    #[serde(default)]
    results: Option<Vec<Record>>,
}

/// One decoded page.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub total_count: Option<u64>,
    pub records: Vec<Record>,
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        Self {
            total_count: response.total_notices,
            records: response
                .notices
                .or(response.results)
                .unwrap_or_default(),
        }
    }
}

/// Why pagination ended.
#[derive(Debug)]
pub enum StopReason {
    /// The record cap was reached; results were truncated to it.
    LimitReached,
    /// An empty page, or every page the reported total covers, was fetched.
    EndOfResults,
    /// `max_pages` pages were fetched.
    PageCapReached,
    /// A page fetch failed; records gathered before it are kept.
    Failed(SearchError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LimitReached => write!(f, "record limit reached"),
            StopReason::EndOfResults => write!(f, "end of results"),
            StopReason::PageCapReached => write!(f, "page cap reached"),
            StopReason::Failed(e) => write!(f, "stopped early: {}", e),
        }
    }
}

/// Result of a search: the records plus why fetching stopped.
#[derive(Debug)]
pub struct SearchOutcome {
    pub records: Vec<Record>,
    pub stop: StopReason,
    pub pages_fetched: u32,
    /// Total reported by the server on the first page.
    pub total_count: Option<u64>,
}

impl SearchOutcome {
    /// False when a fetch error cut the search short.
    pub fn is_complete(&self) -> bool {
        !matches!(self.stop, StopReason::Failed(_))
    }

    pub fn error(&self) -> Option<&SearchError> {
        match &self.stop {
            StopReason::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
