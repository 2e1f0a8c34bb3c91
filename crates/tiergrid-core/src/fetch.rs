//! Resilient JSON fetch primitive: one logical GET with a bounded deadline,
//! failure classification, and a backoff retry loop.
//!
//! This is the only layer that retries. Everything above it (resource
//! fetchers, the query store, derived views) propagates the terminal
//! [`FetchError`] unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;

/// Recognized fetch options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Prefix prepended to the endpoint path when non-empty.
    pub base_url: String,
    /// Deadline per attempt; a fired deadline aborts the in-flight call and
    /// classifies as a retryable timeout.
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Extra request headers, merged over the defaults.
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            headers: BTreeMap::new(),
        }
    }
}

impl FetchOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }
}

/// The fetch primitive.
///
/// Cheap to clone; the transport is shared. All timers it arms are dropped on
/// settlement, success or failure.
#[derive(Clone)]
pub struct JsonFetcher {
    http: Arc<dyn HttpClient>,
    options: FetchOptions,
}

impl JsonFetcher {
    pub fn new(http: Arc<dyn HttpClient>, options: FetchOptions) -> Self {
        Self { http, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Request URL for an endpoint path: `base_url + path` when the base is
    /// non-empty, the path verbatim otherwise.
    pub fn request_url(&self, path: &str) -> String {
        if self.options.base_url.is_empty() {
            path.to_string()
        } else {
            format!("{}{}", self.options.base_url, path)
        }
    }

    /// Fetch and deserialize a JSON document with the configured retry budget.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        self.fetch_with_retry(path, self.options.retry).await
    }

    /// Fetch and deserialize with an explicit retry budget (static assets use
    /// [`RetryConfig::no_retry`]).
    pub async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        retry: RetryConfig,
    ) -> Result<T, FetchError> {
        let body = self.fetch_body(path, retry).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::decode(path, e.to_string()))
    }

    /// Fetch raw parsed JSON. Convenience for the query store, which caches
    /// untyped documents.
    pub async fn fetch_value(&self, path: &str) -> Result<Value, FetchError> {
        self.fetch(path).await
    }

    async fn fetch_body(&self, path: &str, retry: RetryConfig) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(path).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    if !err.retryable() || attempt >= retry.max_retries {
                        tracing::warn!(
                            endpoint = path,
                            code = err.code(),
                            attempts = attempt + 1,
                            "fetch failed terminally"
                        );
                        return Err(err);
                    }

                    let delay = retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        endpoint = path,
                        code = err.code(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retryable fetch failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One network attempt: build the request, enforce the deadline, classify
    /// the outcome.
    async fn attempt(&self, path: &str) -> Result<String, FetchError> {
        let url = self.request_url(path);
        let mut request = HttpRequest::get(url).with_header("content-type", "application/json");
        for (name, value) in &self.options.headers {
            request = request.with_header(name, value);
        }

        // The deadline wraps the transport call itself, so it binds every
        // HttpClient implementation; dropping the future aborts the call.
        let outcome = tokio::time::timeout(self.options.timeout, self.http.execute(request)).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(transport)) => {
                return Err(FetchError::network(path, transport.message()));
            }
            Err(_) => return Err(FetchError::timeout(path, self.options.timeout)),
        };

        if !response.is_success() {
            return Err(FetchError::http(path, response.status));
        }

        tracing::debug!(endpoint = path, "fetch succeeded");
        Ok(response.body)
    }
}
