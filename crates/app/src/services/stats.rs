use std::sync::Arc;

use chrono::Utc;
use folio_core::SiteStats;
use folio_upstream::CloudflareClient;
use tracing::debug;

use super::SharedConfig;
use crate::cache::TtlCell;
use crate::error::{AppError, Result};

/// Daily windows summed into one report.
pub const STATS_WINDOW_DAYS: u32 = 7;

#[derive(Clone)]
pub struct StatsService {
    config: SharedConfig,
    client: CloudflareClient,
    cache: Arc<TtlCell<SiteStats>>,
}

impl StatsService {
    pub(super) fn new(config: SharedConfig, client: CloudflareClient) -> Self {
        let cache = Arc::new(TtlCell::new(config.ttls.stats));
        Self {
            config,
            client,
            cache,
        }
    }

    pub async fn weekly(&self) -> Result<SiteStats> {
        if let Some(stats) = self.cache.fresh() {
            debug!("site stats cache hit");
            return Ok(stats);
        }
        let (token, zone) = self.config.cloudflare.require()?;
        let windows = self
            .client
            .daily_traffic(&token, &zone, Utc::now(), STATS_WINDOW_DAYS)
            .await
            .map_err(|err| AppError::upstream("Failed to fetch Cloudflare stats", err))?;
        let stats = SiteStats::from_windows(&windows, 24);
        self.cache.store(stats.clone());
        Ok(stats)
    }
}
