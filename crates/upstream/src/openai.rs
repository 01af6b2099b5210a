//! OpenAI organization usage (completions) client.

use chrono::{DateTime, Utc};
use folio_core::OpenAiTokenCounts;
use serde::Deserialize;
use tracing::debug;

use crate::client::{join_url, next_page_token, truncate};
use crate::error::{Result, UpstreamError};
use crate::UpstreamEndpoints;

const USAGE_PATH: &str = "v1/organization/usage/completions";
const BUCKET_WIDTH: &str = "1d";
const PAGE_LIMIT: &str = "31";

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
    input_tokens: u64,
    output_tokens: u64,
    input_cached_tokens: u64,
    num_model_requests: u64,
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, endpoints: &UpstreamEndpoints) -> Self {
        Self {
            http,
            base: endpoints.openai_api.clone(),
        }
    }

    pub async fn usage_counts(
        &self,
        admin_key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<OpenAiTokenCounts> {
        let url = join_url(&self.base, USAGE_PATH);
        let mut counts = OpenAiTokenCounts::default();
        let mut page: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = vec![
                ("start_time", start.timestamp().to_string()),
                ("end_time", end.timestamp().to_string()),
                ("bucket_width", BUCKET_WIDTH.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(token) = &page {
                query.push(("page", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(admin_key)
                .header("Content-Type", "application/json")
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = truncate(body.trim(), 512);
                return Err(match status.as_u16() {
                    429 => UpstreamError::RateLimited(message),
                    code => UpstreamError::Status {
                        status: code,
                        message,
                    },
                });
            }

            let bytes = response.bytes().await?;
            let payload: UsagePage = serde_json::from_slice(&bytes)?;
            for result in payload.data.iter().flat_map(|bucket| &bucket.results) {
                counts.requests += result.num_model_requests;
                counts.input_tokens += result.input_tokens;
                counts.output_tokens += result.output_tokens;
                counts.cached_tokens += result.input_cached_tokens;
            }
            pages += 1;

            page = next_page_token(payload.has_more, payload.next_page, page.as_deref(), pages)?;
            if page.is_none() {
                break;
            }
        }

        debug!("openai usage read in {pages} page(s)");
        Ok(counts)
    }
}
