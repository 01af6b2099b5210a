use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use folio_core::{ANTHROPIC_RATES, AnthropicUsageTotals, OpenAiUsageTotals};
use folio_upstream::{AnthropicClient, OpenAiClient};
use tracing::{debug, warn};

use super::SharedConfig;
use crate::cache::TtlCell;
use crate::error::{AppError, Result};

/// Serves a fresh cached value, otherwise refreshes. A rate-limited refresh
/// falls back to the last value even when it has expired.
async fn cached_or_refresh<T, F, Fut>(cache: &TtlCell<T>, label: &str, refresh: F) -> Result<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(value) = cache.fresh() {
        debug!("{label} usage cache hit");
        return Ok(value);
    }
    match refresh().await {
        Ok(value) => {
            cache.store(value.clone());
            Ok(value)
        }
        Err(err) if err.is_rate_limited() => match cache.stale() {
            Some(value) => {
                warn!("{label} usage rate limited; serving stale totals");
                Ok(value)
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}

#[derive(Clone)]
pub struct AnthropicUsageService {
    config: SharedConfig,
    client: AnthropicClient,
    cache: Arc<TtlCell<AnthropicUsageTotals>>,
}

impl AnthropicUsageService {
    pub(super) fn new(config: SharedConfig, client: AnthropicClient) -> Self {
        let cache = Arc::new(TtlCell::new(config.ttls.anthropic_usage));
        Self {
            config,
            client,
            cache,
        }
    }

    pub async fn totals(&self) -> Result<AnthropicUsageTotals> {
        cached_or_refresh(self.cache.as_ref(), "anthropic", || self.fetch()).await
    }

    async fn fetch(&self) -> Result<AnthropicUsageTotals> {
        let (admin_key, start) = self.config.anthropic.require()?;
        let now = Utc::now();
        let counts = self
            .client
            .usage_counts(&admin_key, start, now)
            .await
            .map_err(|err| AppError::upstream("Failed to fetch Anthropic usage", err))?;
        Ok(AnthropicUsageTotals::from_counts(
            counts,
            &ANTHROPIC_RATES,
            now.timestamp(),
        ))
    }
}

#[derive(Clone)]
pub struct OpenAiUsageService {
    config: SharedConfig,
    client: OpenAiClient,
    cache: Arc<TtlCell<OpenAiUsageTotals>>,
}

impl OpenAiUsageService {
    pub(super) fn new(config: SharedConfig, client: OpenAiClient) -> Self {
        let cache = Arc::new(TtlCell::new(config.ttls.openai_usage));
        Self {
            config,
            client,
            cache,
        }
    }

    pub async fn totals(&self) -> Result<OpenAiUsageTotals> {
        cached_or_refresh(self.cache.as_ref(), "openai", || self.fetch()).await
    }

    async fn fetch(&self) -> Result<OpenAiUsageTotals> {
        let (admin_key, start) = self.config.openai.require()?;
        let now = Utc::now();
        let counts = self
            .client
            .usage_counts(&admin_key, start, now)
            .await
            .map_err(|err| AppError::upstream("Failed to fetch OpenAI usage", err))?;
        Ok(OpenAiUsageTotals::from_counts(
            counts,
            start.timestamp(),
            now.timestamp(),
            now.timestamp(),
        ))
    }
}
