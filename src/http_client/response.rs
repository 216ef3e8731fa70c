//! HTTP response wrappers.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

/// Response body source - either pending (reqwest) or already in memory.
pub(crate) enum ResponseBody {
    /// Pending response from reqwest.
    Pending(Response),
    /// Already fetched content.
    Ready(Vec<u8>),
}

/// HTTP response wrapper.
///
/// Header names are stored lowercase.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) body: ResponseBody,
}

impl HttpResponse {
    /// Create from a reqwest response.
    pub(crate) fn from_reqwest(
        status: StatusCode,
        headers: HashMap<String, String>,
        response: Response,
    ) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Pending(response),
        }
    }

    /// Create from already-fetched content.
    pub fn from_bytes(
        status: StatusCode,
        headers: HashMap<String, String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body: ResponseBody::Ready(content.into()),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response is HTTP 429 Too Many Requests.
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Get the raw Retry-After header.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after").map(|s| s.as_str())
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        match self.body {
            ResponseBody::Pending(response) => response.bytes().await.map(|b| b.to_vec()),
            ResponseBody::Ready(bytes) => Ok(bytes),
        }
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        match self.body {
            ResponseBody::Pending(response) => response.text().await,
            ResponseBody::Ready(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
