//! Anthropic Admin API usage report client.

use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::AnthropicTokenCounts;
use serde::Deserialize;
use tracing::debug;

use crate::client::{join_url, next_page_token, truncate};
use crate::error::{Result, UpstreamError};
use crate::UpstreamEndpoints;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const USAGE_PATH: &str = "v1/organizations/usage_report/messages";
const BUCKET_WIDTH: &str = "1h";
const PAGE_LIMIT: &str = "168";

#[derive(Debug, Deserialize)]
struct UsagePage {
    #[serde(default)]
    data: Vec<UsageBucket>,
    #[serde(default)]
    has_more: bool,
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBucket {
    #[serde(default)]
    results: Vec<UsageResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UsageResult {
    uncached_input_tokens: u64,
    output_tokens: u64,
    cache_read_input_tokens: u64,
    cache_creation: CacheCreation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CacheCreation {
    ephemeral_5m_input_tokens: u64,
    ephemeral_1h_input_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, endpoints: &UpstreamEndpoints) -> Self {
        Self {
            http,
            base: endpoints.anthropic_api.clone(),
        }
    }

    /// Walks every page of the usage report between `starting_at` and `ending_at`.
    pub async fn usage_counts(
        &self,
        admin_key: &str,
        starting_at: DateTime<Utc>,
        ending_at: DateTime<Utc>,
    ) -> Result<AnthropicTokenCounts> {
        let url = join_url(&self.base, USAGE_PATH);
        let starting_at = starting_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let ending_at = ending_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut counts = AnthropicTokenCounts::default();
        let mut page: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = vec![
                ("starting_at", starting_at.clone()),
                ("ending_at", ending_at.clone()),
                ("bucket_width", BUCKET_WIDTH.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(token) = &page {
                query.push(("page", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .header("x-api-key", admin_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            let bytes = response.bytes().await?;
            if !status.is_success() {
                return Err(classify_error(status.as_u16(), &bytes));
            }

            let payload: UsagePage = serde_json::from_slice(&bytes)?;
            accumulate(&mut counts, &payload);
            pages += 1;

            page = next_page_token(payload.has_more, payload.next_page, page.as_deref(), pages)?;
            if page.is_none() {
                break;
            }
        }

        debug!("anthropic usage report read in {pages} page(s)");
        Ok(counts)
    }
}

fn accumulate(counts: &mut AnthropicTokenCounts, page: &UsagePage) {
    for result in page.data.iter().flat_map(|bucket| &bucket.results) {
        counts.input_tokens += result.uncached_input_tokens;
        counts.output_tokens += result.output_tokens;
        counts.cache_read_tokens += result.cache_read_input_tokens;
        counts.cache_creation_tokens += result.cache_creation.ephemeral_5m_input_tokens
            + result.cache_creation.ephemeral_1h_input_tokens;
    }
}

fn classify_error(status: u16, body: &[u8]) -> UpstreamError {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    let error = envelope.error.unwrap_or_default();
    let message = error
        .message
        .unwrap_or_else(|| truncate(String::from_utf8_lossy(body).trim(), 512));
    if status == 429 || error.kind.as_deref() == Some("rate_limit_error") {
        return UpstreamError::RateLimited(message);
    }
    UpstreamError::Status { status, message }
}
