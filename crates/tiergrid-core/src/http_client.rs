//! HTTP transport abstraction used by the fetch primitive.
//!
//! The [`HttpClient`] trait is the only seam between this crate and the
//! network. Production code uses [`ReqwestHttpClient`]; tests use
//! [`ScriptedHttpClient`] to play back deterministic response sequences.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Outgoing request envelope. The layer only ever issues GET requests with
/// no body; deadlines are enforced by the caller, not the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }
}

/// Response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract. Implementations must be shareable across tasks.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent("tiergrid/0.1.0")
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);

            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Respond immediately with a status and body.
    Respond { status: u16, body: String },
    /// Respond after a delay; combined with a caller-side deadline this
    /// simulates a slow upstream.
    RespondAfter {
        delay: Duration,
        status: u16,
        body: String,
    },
    /// Fail at the transport level (no HTTP response).
    Fail(String),
}

impl ScriptedReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Respond {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Respond {
            status,
            body: String::new(),
        }
    }
}

/// Deterministic offline transport for tests.
///
/// Replies are consumed in order; once the script is exhausted every further
/// request gets `200` with the fallback body (`{}` unless set). The call
/// counter observes how many network requests actually went out, which is
/// what the dedup and retry tests assert on.
#[derive(Debug, Clone)]
pub struct ScriptedHttpClient {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    fallback_body: String,
    calls: Arc<AtomicUsize>,
}

impl Default for ScriptedHttpClient {
    fn default() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback_body: String::from("{}"),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let client = Self::new();
        for reply in replies {
            client.push(reply);
        }
        client
    }

    /// Transport that answers every request with `200` and the given body.
    pub fn always_ok(body: impl Into<String>) -> Self {
        Self {
            fallback_body: body.into(),
            ..Self::default()
        }
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(reply);
    }

    /// Number of requests executed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();
        let fallback = self.fallback_body.clone();

        Box::pin(async move {
            match reply {
                None => Ok(HttpResponse::ok_json(fallback)),
                Some(ScriptedReply::Respond { status, body }) => {
                    Ok(HttpResponse { status, body })
                }
                Some(ScriptedReply::RespondAfter {
                    delay,
                    status,
                    body,
                }) => {
                    tokio::time::sleep(delay).await;
                    Ok(HttpResponse { status, body })
                }
                Some(ScriptedReply::Fail(message)) => Err(HttpError::new(message)),
            }
        })
    }
}
