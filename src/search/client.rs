//! Pagination driver.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::error::SearchError;
use super::retry::{RetryController, RetryPolicy};
use super::types::{SearchOutcome, SearchPage, SearchRequest, SearchResponse, StopReason};
use crate::config::Settings;
use crate::http_client::{HttpClient, Transport};
use crate::rate_limit::RateLimiter;

/// Longest response body excerpt kept in an HTTP error.
const ERROR_BODY_EXCERPT: usize = 500;

/// Client for the notice search endpoint.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    retry: RetryController,
    endpoint: String,
}

impl SearchClient {
    /// Create a client posting to `endpoint` (the full search URL).
    pub fn new(transport: Arc<dyn Transport>, limiter: RateLimiter, endpoint: &str) -> Self {
        Self {
            transport,
            retry: RetryController::new(limiter, RetryPolicy::default()),
            endpoint: endpoint.to_string(),
        }
    }

    /// Build a reqwest-backed client from settings.
    pub fn from_settings(settings: &Settings, limiter: RateLimiter) -> Result<Self, String> {
        let http = HttpClient::builder(settings.timeout())
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self::new(Arc::new(http), limiter, &settings.search_url()?)
            .with_retry_policy(settings.retry_policy()))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryController::new(self.retry.limiter().clone(), policy);
        self
    }

    /// Transport the client sends through, for follow-up downloads that
    /// should share its connection pool and user agent.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch pages in order until the record cap, the page cap, the end of
    /// results, or a fetch failure.
    ///
    /// Only invalid parameters return `Err`. A failed page ends the search
    /// with the records gathered so far and [`StopReason::Failed`].
    ///
    /// When the server reports no total and `max_pages` is unset, this keeps
    /// going until an empty page comes back, which can take a long time.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        request.validate()?;

        let record_cap = request.record_cap();
        let page_size = u64::from(request.page_size);
        let mut page_cap = request.last_page_allowed();
        let mut total_pages: Option<u64> = None;
        let mut total_count: Option<u64> = None;
        let mut current_page = u64::from(request.page);
        let mut pages_fetched = 0u32;
        let mut records = Vec::new();

        let stop = loop {
            if page_cap.is_some_and(|cap| current_page > cap) {
                break if total_pages.is_some_and(|pages| current_page > pages) {
                    StopReason::EndOfResults
                } else {
                    StopReason::PageCapReached
                };
            }

            let page = match self.fetch_page(request, current_page).await {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        "Error fetching page {}: {} ({} records kept)",
                        current_page,
                        e,
                        records.len()
                    );
                    break StopReason::Failed(e);
                }
            };
            pages_fetched += 1;

            if pages_fetched == 1 {
                if let Some(total) = page.total_count {
                    let pages = total.div_ceil(page_size);
                    total_count = Some(total);
                    total_pages = Some(pages);
                    page_cap = Some(page_cap.map_or(pages, |cap| cap.min(pages)));
                    info!(
                        "Found {} results, expecting {} pages",
                        total,
                        page_cap.unwrap_or(pages)
                    );
                }
            }

            let page_len = page.records.len();
            records.extend(
                page.records
                    .into_iter()
                    .filter(|record| request.filter.matches(record)),
            );
            debug!(
                "Page {}: {} records, {} accumulated",
                current_page,
                page_len,
                records.len()
            );

            if records.len() >= record_cap {
                records.truncate(record_cap);
                break StopReason::LimitReached;
            }

            if page_len == 0 {
                info!("No more results on page {}", current_page);
                break StopReason::EndOfResults;
            }

            current_page += 1;
        };

        info!(
            "Search finished after {} page(s) with {} records: {}",
            pages_fetched,
            records.len(),
            stop
        );

        Ok(SearchOutcome {
            records,
            stop,
            pages_fetched,
            total_count,
        })
    }

    /// Ask the server how many notices match `query`.
    ///
    /// Issues a single one-record request. Unlike [`Self::search`], fetch
    /// failures are returned as errors.
    pub async fn count(&self, query: &str) -> Result<Option<u64>, SearchError> {
        let request = SearchRequest::new(query).page_size(1);
        let page = self.fetch_page(&request, 1).await?;
        Ok(page.total_count)
    }

    /// Fetch and decode one page through the retry controller.
    async fn fetch_page(
        &self,
        request: &SearchRequest,
        page: u64,
    ) -> Result<SearchPage, SearchError> {
        let body = request.page_body(page);
        debug!("Fetching page {}: {}", page, body);

        let response = self
            .retry
            .attempt(|| self.transport.post_json(&self.endpoint, &body))
            .await?;

        if !response.is_success() {
            let status = response.status.as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::Http {
                status,
                body: text.chars().take(ERROR_BODY_EXCERPT).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(crate::http_client::HttpError::from)?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::fake::ScriptedTransport;
    use crate::http_client::HttpError;
    use crate::search::RecordFilter;
    use serde_json::{json, Value};
    use std::time::Duration;

    const ENDPOINT: &str = "https://ted.test/v3/notices/search";

    fn notice(n: u64, pdf_lang: Option<&str>) -> Value {
        let mut notice = json!({
            "publication-number": format!("{n}-2025"),
            "publication-date": "2025-03-01+01:00",
        });
        if let Some(lang) = pdf_lang {
            notice["links"] = json!({"pdf": {lang: format!("https://ted.test/{n}/pdf")}});
        }
        notice
    }

    fn page(total: Option<u64>, ids: std::ops::Range<u64>) -> Value {
        let notices: Vec<Value> = ids.map(|n| notice(n, None)).collect();
        match total {
            Some(total) => json!({"totalNotices": total, "notices": notices}),
            None => json!({"notices": notices}),
        }
    }

    fn client(transport: &Arc<ScriptedTransport>) -> SearchClient {
        SearchClient::new(transport.clone(), RateLimiter::default(), ENDPOINT)
    }

    fn numbers(outcome: &SearchOutcome) -> Vec<String> {
        outcome
            .records
            .iter()
            .filter_map(|r| r.publication_number().map(str::to_string))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_pages_covering_total() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(45), 0..20))
                .reply_json(page(Some(45), 20..40))
                .reply_json(page(Some(45), 40..45)),
        );
        let request = SearchRequest::new("CY=DEU").limit(100);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2, 3]);
        assert_eq!(outcome.len(), 45);
        assert_eq!(outcome.total_count, Some(45));
        assert_eq!(outcome.pages_fetched, 3);
        assert!(matches!(outcome.stop, StopReason::EndOfResults));
        assert!(outcome.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn request_body_carries_query_fields_and_page_size() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(page(Some(3), 0..3)));
        let request = SearchRequest::new("FT~(\"bridge\")")
            .fields(["publication-number"])
            .page_size(50);

        client(&transport).search(&request).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, ENDPOINT);
        assert_eq!(
            sent[0].body,
            Some(json!({
                "query": "FT~(\"bridge\")",
                "fields": ["publication-number"],
                "page": 1,
                "limit": 50,
            }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_page_ends_search_without_total() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(None, 0..2))
                .reply_json(page(None, 0..0)),
        );
        let request = SearchRequest::new("q").page_size(2).limit(10);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2]);
        assert_eq!(numbers(&outcome), vec!["0-2025", "1-2025"]);
        assert_eq!(outcome.total_count, None);
        assert!(matches!(outcome.stop, StopReason::EndOfResults));
    }

    #[tokio::test(start_paused = true)]
    async fn first_page_empty_without_total() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(json!({"notices": []})));

        let outcome = client(&transport)
            .search(&SearchRequest::new("q"))
            .await
            .unwrap();

        assert_eq!(transport.sent().len(), 1);
        assert!(outcome.is_empty());
        assert!(matches!(outcome.stop, StopReason::EndOfResults));
    }

    #[tokio::test(start_paused = true)]
    async fn max_pages_counts_from_start_page() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(1000), 20..30))
                .reply_json(page(Some(1000), 30..40)),
        );
        let request = SearchRequest::new("q")
            .page(3)
            .page_size(10)
            .limit(1000)
            .max_pages(2);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![3, 4]);
        assert_eq!(outcome.len(), 20);
        assert!(matches!(outcome.stop, StopReason::PageCapReached));
    }

    #[tokio::test(start_paused = true)]
    async fn results_truncated_to_limit() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(100), 0..20))
                .reply_json(page(Some(100), 20..40)),
        );
        let request = SearchRequest::new("q").limit(30);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2]);
        assert_eq!(outcome.len(), 30);
        assert_eq!(numbers(&outcome).last().map(String::as_str), Some("29-2025"));
        assert!(matches!(outcome.stop, StopReason::LimitReached));
    }

    #[tokio::test(start_paused = true)]
    async fn limit_defaults_to_page_size() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(page(Some(120), 0..50)));
        let request = SearchRequest::new("RC=\"DE600\"").page_size(50);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(outcome.len(), 50);
        assert!(matches!(outcome.stop, StopReason::LimitReached));
    }

    #[tokio::test(start_paused = true)]
    async fn three_pages_for_regional_query() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(120), 0..50))
                .reply_json(page(Some(120), 50..100))
                .reply_json(page(Some(120), 100..120)),
        );
        let request = SearchRequest::new("RC=\"DE600\"").page_size(50).limit(120);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2, 3]);
        assert_eq!(outcome.len(), 120);
        assert_eq!(outcome.total_count, Some(120));
    }

    #[tokio::test(start_paused = true)]
    async fn filter_runs_before_cap_and_keeps_order() {
        let first = json!({
            "totalNotices": 8,
            "notices": [
                notice(1, Some("DEU")),
                notice(2, None),
                notice(3, Some("ENG")),
                notice(4, Some("DEU")),
            ],
        });
        let second = json!({
            "totalNotices": 8,
            "notices": [
                notice(5, None),
                notice(6, Some("DEU")),
                notice(7, Some("DEU")),
                notice(8, Some("DEU")),
            ],
        });
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(first)
                .reply_json(second),
        );
        let request = SearchRequest::new("q")
            .page_size(4)
            .limit(3)
            .filter(RecordFilter::pdf_language("DEU"));

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2]);
        assert_eq!(numbers(&outcome), vec!["1-2025", "4-2025", "6-2025"]);
        assert!(matches!(outcome.stop, StopReason::LimitReached));
    }

    #[tokio::test(start_paused = true)]
    async fn page_filtered_to_nothing_does_not_end_search() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(json!({"notices": [notice(1, None), notice(2, None)]}))
                .reply_json(json!({"notices": [notice(3, Some("DEU"))]}))
                .reply_json(json!({"notices": []})),
        );
        let request = SearchRequest::new("q")
            .page_size(2)
            .limit(10)
            .filter(RecordFilter::pdf_language("DEU"));

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.pages_requested(), vec![1, 2, 3]);
        assert_eq!(numbers(&outcome), vec!["3-2025"]);
        assert!(matches!(outcome.stop, StopReason::EndOfResults));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_earlier_pages() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(60), 0..20))
                .fail(HttpError::Timeout("deadline elapsed".to_string())),
        );
        let request = SearchRequest::new("q").limit(60);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(outcome.len(), 20);
        assert_eq!(outcome.pages_fetched, 1);
        assert!(!outcome.is_complete());
        assert!(outcome.error().is_some_and(SearchError::is_timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_reported_with_status() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(60), 0..20))
                .reply(500, "upstream exploded"),
        );
        let request = SearchRequest::new("q").limit(60);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(outcome.len(), 20);
        match outcome.stop {
            StopReason::Failed(SearchError::Http { status, ref body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            ref other => panic!("unexpected stop: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_body_fails_first_page() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, "<html>oops</html>"));

        let outcome = client(&transport)
            .search(&SearchRequest::new("q"))
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.pages_fetched, 0);
        assert!(matches!(
            outcome.stop,
            StopReason::Failed(SearchError::Malformed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhaustion_keeps_earlier_pages() {
        let mut script = ScriptedTransport::new().reply_json(page(Some(40), 0..20));
        for _ in 0..5 {
            script = script.reply(429, "slow down");
        }
        let transport = Arc::new(script);
        let request = SearchRequest::new("q").limit(40);

        let outcome = client(&transport).search(&request).await.unwrap();

        assert_eq!(transport.sent().len(), 6);
        assert_eq!(outcome.len(), 20);
        assert!(matches!(
            outcome.stop,
            StopReason::Failed(SearchError::RateLimited { attempts: 5 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_request_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new());
        let request = SearchRequest::new("q").page_size(0);

        let result = client(&transport).search(&request).await;

        assert!(matches!(result, Err(SearchError::Config(_))));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_spaced_by_limiter() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(page(Some(6), 0..2))
                .reply_json(page(Some(6), 2..4))
                .reply_json(page(Some(6), 4..6)),
        );
        let client = SearchClient::new(
            transport.clone(),
            RateLimiter::new(Duration::from_millis(300)),
            ENDPOINT,
        );
        let start = tokio::time::Instant::now();

        client
            .search(&SearchRequest::new("q").page_size(2).limit(6))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn count_asks_for_one_record() {
        let transport = Arc::new(ScriptedTransport::new().reply_json(page(Some(1234), 0..1)));

        let total = client(&transport).count("CY=FRA").await.unwrap();

        assert_eq!(total, Some(1234));
        let body = transport.sent()[0].body.clone().unwrap();
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["query"], "CY=FRA");
    }

    #[tokio::test(start_paused = true)]
    async fn count_propagates_failures() {
        let transport = Arc::new(ScriptedTransport::new().reply(400, "bad query"));

        let result = client(&transport).count("CY=").await;

        assert!(matches!(
            result,
            Err(SearchError::Http { status: 400, .. })
        ));
    }
}
