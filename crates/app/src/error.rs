use folio_upstream::UpstreamError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: UpstreamError,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Message(String),
}

impl AppError {
    pub fn upstream(context: impl Into<String>, source: UpstreamError) -> Self {
        AppError::Upstream {
            context: context.into(),
            source,
        }
    }

    pub fn missing_config(names: &[&str]) -> Self {
        AppError::Config(format!("Missing {} configuration.", names.join(" or ")))
    }

    /// True when the upstream rejected the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::Upstream { source, .. } if source.is_rate_limited())
    }
}

impl From<UpstreamError> for AppError {
    fn from(source: UpstreamError) -> Self {
        AppError::upstream("upstream request failed", source)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, code, details) = match &err {
            AppError::Config(_) => (500, Some("config_missing"), None),
            AppError::InvalidInput(_) => (400, Some("invalid_input"), None),
            AppError::Upstream { source, .. } => (
                502,
                Some("upstream"),
                Some(
                    source
                        .details()
                        .unwrap_or_else(|| Value::String(source.to_string())),
                ),
            ),
            AppError::Serde(_) | AppError::Message(_) => (500, None, None),
        };
        Self {
            status,
            error: err.to_string(),
            code: code.map(str::to_string),
            details,
        }
    }
}
