use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

/// Validation errors for domain identifiers and payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("scenario id cannot be empty")]
    EmptyScenarioId,
    #[error("scenario id length {len} exceeds max {max}")]
    ScenarioIdTooLong { len: usize, max: usize },
    #[error("scenario id must start with an ASCII letter or digit: '{ch}'")]
    ScenarioIdInvalidStart { ch: char },
    #[error("scenario id contains invalid character '{ch}' at index {index}")]
    ScenarioIdInvalidChar { ch: char, index: usize },

    #[error("tier code cannot be empty")]
    EmptyTierCode,
    #[error("multi-value tier must contain at least one value")]
    EmptyTierValues,
}

/// Failure classification for a fetch sequence.
///
/// `Network` and `Timeout` carry no HTTP status (status 0). `Http` covers any
/// non-success status. `Decode` marks a body that could not be deserialized.
/// `Unknown` is the catch-all for failures that fit none of the above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Timeout,
    Http,
    Decode,
    Unknown,
}

/// Terminal value of a failed fetch sequence.
///
/// Constructed once per failed attempt; the retry loop propagates the *last*
/// failure observed. The `retryable` flag is fixed at construction:
/// network-level failures and timeouts are retryable, HTTP failures only for
/// 5xx and 429, decode failures never.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    /// HTTP status of the failed response, or 0 for non-HTTP failures.
    status: u16,
    /// Endpoint path the request was addressed to.
    endpoint: String,
    retryable: bool,
}

impl FetchError {
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            status: 0,
            endpoint: endpoint.into(),
            retryable: true,
        }
    }

    pub fn timeout(endpoint: impl Into<String>, after: Duration) -> Self {
        Self {
            kind: FetchErrorKind::Timeout,
            message: format!("request timed out after {}ms", after.as_millis()),
            status: 0,
            endpoint: endpoint.into(),
            retryable: true,
        }
    }

    pub fn http(endpoint: impl Into<String>, status: u16) -> Self {
        Self {
            kind: FetchErrorKind::Http,
            message: format!("server responded with status {status}"),
            status,
            endpoint: endpoint.into(),
            retryable: status >= 500 || status == 429,
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            message: message.into(),
            status: 0,
            endpoint: endpoint.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Network => "fetch.network",
            FetchErrorKind::Timeout => "fetch.timeout",
            FetchErrorKind::Http => "fetch.http",
            FetchErrorKind::Decode => "fetch.decode",
            FetchErrorKind::Unknown => "fetch.unknown",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] ({})", self.message, self.endpoint, self.code())
    }
}

impl std::error::Error for FetchError {}
