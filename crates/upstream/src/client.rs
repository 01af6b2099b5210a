use std::time::Duration;

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{Result, UpstreamError};

pub const USER_AGENT: &str = concat!("folio-telemetry/", env!("CARGO_PKG_VERSION"));

/// Longest upstream error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Upper bound on pages walked for one usage report.
pub const MAX_REPORT_PAGES: usize = 500;

/// Base URLs of every upstream. Defaults are the public services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub github_api: String,
    pub github_web: String,
    pub anthropic_api: String,
    pub openai_api: String,
    pub cloudflare_graphql: String,
    pub iss_now: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            github_web: "https://github.com".to_string(),
            anthropic_api: "https://api.anthropic.com".to_string(),
            openai_api: "https://api.openai.com".to_string(),
            cloudflare_graphql: "https://api.cloudflare.com/client/v4/graphql".to_string(),
            iss_now: "http://api.open-notify.org/iss-now.json".to_string(),
        }
    }
}

impl UpstreamEndpoints {
    /// Points every upstream at one base URL, using the public path layout.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            github_api: base.to_string(),
            github_web: base.to_string(),
            anthropic_api: base.to_string(),
            openai_api: base.to_string(),
            cloudflare_graphql: format!("{base}/client/v4/graphql"),
            iss_now: format!("{base}/iss-now.json"),
        }
    }
}

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        message: truncate(body.trim(), MAX_ERROR_BODY),
    })
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Token for the page after `current`, or `None` when the report is complete.
/// Fails when the upstream repeats a token or exceeds [`MAX_REPORT_PAGES`].
pub(crate) fn next_page_token(
    has_more: bool,
    next: Option<String>,
    current: Option<&str>,
    pages_read: usize,
) -> Result<Option<String>> {
    let Some(next) = next.filter(|_| has_more) else {
        return Ok(None);
    };
    if current == Some(next.as_str()) {
        return Err(UpstreamError::Payload(format!(
            "pagination repeated page token {next}"
        )));
    }
    if pages_read >= MAX_REPORT_PAGES {
        return Err(UpstreamError::Payload(format!(
            "report exceeded {MAX_REPORT_PAGES} pages"
        )));
    }
    Ok(Some(next))
}

pub(crate) fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((index, _)) => format!("{}...", &value[..index]),
        None => value.to_string(),
    }
}
