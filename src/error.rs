//! Error taxonomy for client-side rejections and remote failures.
//!
//! Nothing here is fatal: every variant leaves prior in-memory state intact
//! and surfaces to the caller for a retry.

use thiserror::Error;

/// Body of a non-2xx response.
///
/// The service normally answers with JSON (`{"detail": ...}`), but proxies
/// and half-dead servers answer with whatever they like, so the raw text is
/// kept when parsing fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(serde_json::Value),
    Text(String),
}

impl ErrorBody {
    /// Opportunistically parse a response body as JSON.
    pub fn parse(raw: String) -> Self {
        match serde_json::from_str(&raw) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(raw),
        }
    }

    /// Best human-readable message available.
    pub fn message(&self) -> String {
        match self {
            ErrorBody::Json(value) => value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            ErrorBody::Text(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Everything that can go wrong between a command and the service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected locally, before any network call.
    #[error("validation: {0}")]
    Validation(String),

    /// Advisory client-side mirror of a server entitlement check.
    #[error("plan restriction: {0}")]
    PlanRestriction(String),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: ErrorBody },

    /// The request was aborted after its deadline.
    #[error("request timed out")]
    Timeout,

    /// The request never completed the HTTP exchange (DNS, connect, TLS,
    /// or a response body that was not the promised JSON).
    #[error("transport: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Classify a reqwest failure; timeouts get their own variant.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err)
        }
    }

    /// True for the service's 404 on a missing or already-deleted resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }
}
