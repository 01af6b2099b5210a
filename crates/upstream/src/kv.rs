//! Client for an Upstash-compatible Redis REST endpoint.

use serde::Deserialize;
use serde_json::Value;

use crate::client::{join_url, truncate};
use crate::error::{Result, UpstreamError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvCredentials {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

#[derive(Clone)]
pub struct KvClient {
    http: reqwest::Client,
    credentials: KvCredentials,
}

impl KvClient {
    pub fn new(http: reqwest::Client, credentials: KvCredentials) -> Self {
        Self { http, credentials }
    }

    /// `Ok(None)` when the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(join_url(&self.credentials.url, &format!("get/{key}")))
            .bearer_auth(&self.credentials.token)
            .send()
            .await?;
        let reply = read_reply(response).await?;
        Ok(match reply.result {
            Value::Null => None,
            Value::String(value) => Some(value),
            other => Some(other.to_string()),
        })
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let response = self
            .http
            .post(join_url(&self.credentials.url, &format!("set/{key}")))
            .bearer_auth(&self.credentials.token)
            .body(value.to_string())
            .send()
            .await?;
        read_reply(response).await?;
        Ok(())
    }
}

async fn read_reply(response: reqwest::Response) -> Result<KvReply> {
    let status = response.status();
    let body = response.text().await?;
    let reply: KvReply = serde_json::from_str(&body).unwrap_or_default();
    if let Some(message) = reply.error.as_deref() {
        return Err(classify_error(status.as_u16(), message));
    }
    if !status.is_success() {
        return Err(classify_error(status.as_u16(), &truncate(body.trim(), 512)));
    }
    Ok(reply)
}

fn classify_error(status: u16, message: &str) -> UpstreamError {
    if status == 429 || is_quota_message(message) {
        return UpstreamError::QuotaExceeded(message.to_string());
    }
    UpstreamError::Status {
        status,
        message: message.to_string(),
    }
}

fn is_quota_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("max requests limit")
        || lower.contains("max daily request limit")
        || lower.contains("limit exceeded")
        || lower.contains("quota")
}
