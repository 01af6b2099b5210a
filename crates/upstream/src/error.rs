use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("store quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("unexpected payload: {0}")]
    Payload(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("graphql error")]
    Graphql(Value),
}

impl UpstreamError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::RateLimited(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, UpstreamError::QuotaExceeded(_))
    }

    /// True when no HTTP exchange happened at all (DNS, refused, reset).
    pub fn is_connect(&self) -> bool {
        matches!(self, UpstreamError::Http(err) if err.is_connect())
    }

    /// Structured detail worth echoing to API callers.
    pub fn details(&self) -> Option<Value> {
        match self {
            UpstreamError::Graphql(errors) => Some(errors.clone()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
