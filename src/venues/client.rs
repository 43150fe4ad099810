//! Shared HTTP plumbing for venue adapters
//!
//! Every venue request goes through one [`VenueClient`], which enforces the
//! venue's minimum inter-request spacing, a bounded per-request timeout, and
//! a linear-backoff retry policy. A request arriving before the spacing
//! interval has elapsed is delayed, not rejected.

use reqwest::RequestBuilder;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::PricingConfig;
use crate::error::{Error, Result};

/// Rate-limited, retrying HTTP client for one venue instance
pub struct VenueClient {
    http: reqwest::Client,
    min_interval: Duration,
    /// The reserved send slot of the most recent request
    last_slot: Mutex<Option<Instant>>,
    max_retries: u32,
    backoff_base: Duration,
}

impl VenueClient {
    pub fn new(config: &PricingConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            min_interval: Duration::from_millis(config.min_request_interval_ms),
            last_slot: Mutex::new(None),
            max_retries: config.max_retries.max(1),
            backoff_base: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// GET a URL and parse the response body as JSON
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        self.get_json_with_headers(url, &[]).await
    }

    /// GET with extra headers (API keys and the like)
    pub async fn get_json_with_headers(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<Value> {
        self.send_with_retry(|| {
            let mut req = self.http.get(url);
            for (name, value) in headers {
                req = req.header(*name, value.as_str());
            }
            req
        })
        .await
    }

    /// POST a GraphQL query and return the response body as JSON
    pub async fn post_graphql(&self, url: &str, query: &str, variables: Value) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });
        self.send_with_retry(|| self.http.post(url).json(&body)).await
    }

    async fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> Result<Value> {
        let mut last_err = Error::Venue("request never attempted".to_string());
        for attempt in 1..=self.max_retries {
            self.wait_for_slot().await;
            match Self::send_once(build()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "venue request attempt failed");
                    last_err = e;
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(self.backoff_base * attempt).await;
            }
        }
        Err(last_err)
    }

    async fn send_once(req: RequestBuilder) -> Result<Value> {
        let response = req.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    /// Reserve the next send slot and wait until it arrives
    ///
    /// The slot is claimed under the lock and the sleep happens after the
    /// guard is dropped, so concurrent callers queue up at `min_interval`
    /// spacing without anyone holding the lock across a suspension point.
    async fn wait_for_slot(&self) {
        let wait = {
            let mut last = self.last_slot.lock().await;
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => std::cmp::max(now, prev + self.min_interval),
                None => now,
            };
            *last = Some(slot);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
