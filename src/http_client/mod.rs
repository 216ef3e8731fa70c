//! HTTP transport for the search API.
//!
//! Every attempt is bounded by the client's request timeout. Pacing and
//! retries are not done here; see [`crate::rate_limit`] and
//! [`crate::search::RetryController`].

mod response;
#[cfg(test)]
pub(crate) mod fake;

pub use response::HttpResponse;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

/// Default user agent for API requests.
pub const USER_AGENT: &str = concat!("tedquire/", env!("CARGO_PKG_VERSION"));

/// Errors from a single HTTP attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout(e.to_string())
        } else {
            HttpError::Request(e.to_string())
        }
    }
}

/// The "perform one HTTP request" capability.
///
/// Each call is exactly one network attempt; implementations must not
/// retry or throttle.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body.
    async fn post_json(&self, url: &str, body: &serde_json::Value)
        -> Result<HttpResponse, HttpError>;

    /// Plain GET.
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

fn extract_response_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

/// Builder for constructing `HttpClient`.
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Set the user agent string (defaults to [`USER_AGENT`]).
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Build the `HttpClient`.
    pub fn build(self) -> Result<HttpClient, String> {
        let user_agent = self.user_agent.as_deref().unwrap_or(USER_AGENT);

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(HttpClient {
            client,
            timeout: self.timeout,
        })
    }
}

impl HttpClient {
    /// Create a builder; `timeout` bounds every individual attempt.
    pub fn builder(timeout: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            timeout,
            user_agent: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn wrap(response: Response) -> HttpResponse {
        let response_headers = extract_response_headers(&response);
        HttpResponse::from_reqwest(response.status(), response_headers, response)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, HttpError> {
        let response = self.client.post(url).json(body).send().await?;
        Ok(Self::wrap(response))
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.client.get(url).send().await?;
        Ok(Self::wrap(response))
    }
}
