use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_upstream::{GITHUB_TIMEOUT, KvCredentials, UpstreamEndpoints};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::util::time::parse_start_date;

pub const DEFAULT_GITHUB_USER: &str = "shokace";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

/// Admin key and reporting start for one usage provider.
#[derive(Clone, Debug, Default)]
pub struct UsageCredentials {
    pub admin_key: Option<String>,
    pub start_date: Option<String>,
    key_var: &'static str,
    start_var: &'static str,
}

impl UsageCredentials {
    pub fn new(
        key_var: &'static str,
        start_var: &'static str,
        admin_key: Option<String>,
        start_date: Option<String>,
    ) -> Self {
        Self {
            admin_key,
            start_date,
            key_var,
            start_var,
        }
    }

    pub fn require(&self) -> Result<(String, DateTime<Utc>)> {
        let admin_key = self
            .admin_key
            .clone()
            .ok_or_else(|| AppError::missing_config(&[self.key_var]))?;
        let start_date = self
            .start_date
            .as_deref()
            .ok_or_else(|| AppError::missing_config(&[self.start_var]))?;
        Ok((admin_key, parse_start_date(self.start_var, start_date)?))
    }
}

#[derive(Clone, Debug, Default)]
pub struct CloudflareCredentials {
    pub api_token: Option<String>,
    pub zone_id: Option<String>,
}

impl CloudflareCredentials {
    pub fn require(&self) -> Result<(String, String)> {
        match (&self.api_token, &self.zone_id) {
            (Some(token), Some(zone)) => Ok((token.clone(), zone.clone())),
            _ => Err(AppError::missing_config(&[
                "CLOUDFLARE_API_TOKEN",
                "CLOUDFLARE_ZONE_ID",
            ])),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub anthropic_usage: Duration,
    pub openai_usage: Duration,
    pub activity: Duration,
    pub contributions: Duration,
    pub stats: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            anthropic_usage: Duration::from_secs(60 * 60),
            openai_usage: Duration::from_secs(5 * 60),
            activity: Duration::from_secs(5 * 60),
            contributions: Duration::from_secs(60 * 60),
            stats: Duration::from_secs(5 * 60),
        }
    }
}

/// Everything the services need to reach their upstreams.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub github_user: String,
    pub github_token: Option<String>,
    pub anthropic: UsageCredentials,
    pub openai: UsageCredentials,
    pub cloudflare: CloudflareCredentials,
    pub kv: Option<KvCredentials>,
    pub endpoints: UpstreamEndpoints,
    pub upstream_timeout: Duration,
    /// Per-request cap on GitHub calls, tighter than `upstream_timeout`.
    pub github_timeout: Duration,
    pub ttls: CacheTtls,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Reads secrets from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            let value = lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            if value.is_none() {
                debug!("{name} is not set");
            }
            value
        };
        let kv = match (var("KV_REST_API_URL"), var("KV_REST_API_TOKEN")) {
            (Some(url), Some(token)) => Some(KvCredentials { url, token }),
            _ => match (var("UPSTASH_REDIS_REST_URL"), var("UPSTASH_REDIS_REST_TOKEN")) {
                (Some(url), Some(token)) => Some(KvCredentials { url, token }),
                _ => None,
            },
        };
        Self {
            github_user: DEFAULT_GITHUB_USER.to_string(),
            github_token: var("GITHUB_TOKEN"),
            anthropic: UsageCredentials::new(
                "ANTHROPIC_ADMIN_KEY",
                "ANTHROPIC_USAGE_START_DATE",
                var("ANTHROPIC_ADMIN_KEY"),
                var("ANTHROPIC_USAGE_START_DATE"),
            ),
            openai: UsageCredentials::new(
                "OPENAI_ADMIN_KEY",
                "OPENAI_USAGE_START_DATE",
                var("OPENAI_ADMIN_KEY"),
                var("OPENAI_USAGE_START_DATE"),
            ),
            cloudflare: CloudflareCredentials {
                api_token: var("CLOUDFLARE_API_TOKEN"),
                zone_id: var("CLOUDFLARE_ZONE_ID"),
            },
            kv,
            endpoints: UpstreamEndpoints::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            github_timeout: GITHUB_TIMEOUT,
            ttls: CacheTtls::default(),
        }
    }

    pub fn with_github_user(mut self, user: impl Into<String>) -> Self {
        self.github_user = user.into();
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_github_timeout(mut self, timeout: Duration) -> Self {
        self.github_timeout = timeout;
        self
    }

    pub fn with_endpoints(mut self, endpoints: UpstreamEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
