//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::{HttpError, HttpResponse, Transport};

/// One request seen by the fake.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub url: String,
    pub body: Option<Value>,
}

/// Replays queued replies in order and records what was sent.
///
/// Once the queue is drained every further call gets a 500.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let response =
            HttpResponse::from_bytes(StatusCode::from_u16(status).unwrap(), HashMap::new(), body);
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn reply_json(self, body: Value) -> Self {
        self.reply(200, body.to_string())
    }

    pub fn fail(self, error: HttpError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// The `page` field of every JSON body sent, in order.
    pub fn pages_requested(&self) -> Vec<u64> {
        self.sent()
            .iter()
            .filter_map(|r| r.body.as_ref()?.get("page")?.as_u64())
            .collect()
    }

    fn next(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse, HttpError> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            body: body.cloned(),
        });
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(HttpResponse::from_bytes(
                StatusCode::INTERNAL_SERVER_ERROR,
                HashMap::new(),
                "script exhausted",
            ))
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, HttpError> {
        self.next(url, Some(body))
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.next(url, None)
    }
}
