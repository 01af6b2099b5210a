use serde::{Deserialize, Serialize};

pub mod activity;
pub mod trail;

pub use activity::{ACTIVITY_LIMIT, finalize_activity, placeholder_activity, repo_from_github_url};
pub use trail::{
    TRAIL_STORE_KEY, TRAIL_WINDOW_MS, TRAIL_WRITE_COOLDOWN_MS, TrailUpdate, advance_trail,
    merge_trail, prune_trail, should_append,
};

/// One observed ISS position. `ts` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub lat: f64,
    pub lon: f64,
    pub ts: i64,
}

impl TrailPoint {
    /// Identity used for deduplication. Coordinates compare bit for bit.
    pub fn key(&self) -> (i64, u64, u64) {
        (self.ts, self.lat.to_bits(), self.lon.to_bits())
    }
}

/// Coordinates exactly as reported by Open-Notify (decimal strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssPosition {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssSnapshot {
    pub message: String,
    pub timestamp: i64,
    pub iss_position: IssPosition,
    pub trail: Vec<TrailPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Commit,
    PullRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub url: String,
    pub repo: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeed {
    pub user: String,
    pub items: Vec<ActivityItem>,
}

/// Raw counters accumulated across every page of an Anthropic usage report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicTokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl AnthropicTokenCounts {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_creation_tokens
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicUsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_read_tokens: u64,
    pub cached_creation_tokens: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub updated_at: i64,
}

impl AnthropicUsageTotals {
    pub fn from_counts(counts: AnthropicTokenCounts, rates: &TokenRates, updated_at: i64) -> Self {
        Self {
            input_tokens: counts.input_tokens,
            output_tokens: counts.output_tokens,
            cached_read_tokens: counts.cache_read_tokens,
            cached_creation_tokens: counts.cache_creation_tokens,
            total_tokens: counts.total_tokens(),
            total_cost_usd: compute_cost_usd(counts, rates),
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiTokenCounts {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiUsageTotals {
    pub requests: u64,
    pub tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
    pub updated_at: i64,
    pub start_time: i64,
    pub end_time: i64,
}

impl OpenAiUsageTotals {
    pub fn from_counts(counts: OpenAiTokenCounts, start_time: i64, end_time: i64, updated_at: i64) -> Self {
        Self {
            requests: counts.requests,
            tokens: counts.input_tokens + counts.output_tokens,
            input_tokens: counts.input_tokens,
            output_tokens: counts.output_tokens,
            cached_tokens: counts.cached_tokens,
            updated_at,
            start_time,
            end_time,
        }
    }
}

/// Flat USD-per-million rates for each token category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenRates {
    pub input_per_1m: f64,
    pub output_per_1m: f64,
    pub cache_read_per_1m: f64,
    pub cache_write_per_1m: f64,
}

/// Sonnet list prices, used as a display estimate for the whole account.
pub const ANTHROPIC_RATES: TokenRates = TokenRates {
    input_per_1m: 3.0,
    output_per_1m: 15.0,
    cache_read_per_1m: 0.3,
    cache_write_per_1m: 3.75,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub cache_read_cost_usd: f64,
    pub cache_write_cost_usd: f64,
    pub total_cost_usd: f64,
}

pub fn compute_cost_usd(counts: AnthropicTokenCounts, rates: &TokenRates) -> f64 {
    compute_cost_breakdown(counts, rates).total_cost_usd
}

pub fn compute_cost_breakdown(counts: AnthropicTokenCounts, rates: &TokenRates) -> CostBreakdown {
    let input_cost = (counts.input_tokens as f64 / 1_000_000.0) * rates.input_per_1m;
    let output_cost = (counts.output_tokens as f64 / 1_000_000.0) * rates.output_per_1m;
    let cache_read_cost = (counts.cache_read_tokens as f64 / 1_000_000.0) * rates.cache_read_per_1m;
    let cache_write_cost =
        (counts.cache_creation_tokens as f64 / 1_000_000.0) * rates.cache_write_per_1m;
    CostBreakdown {
        input_cost_usd: input_cost,
        output_cost_usd: output_cost,
        cache_read_cost_usd: cache_read_cost,
        cache_write_cost_usd: cache_write_cost,
        total_cost_usd: input_cost + output_cost + cache_read_cost + cache_write_cost,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCell {
    pub date: String,
    pub level: u8,
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionGrid {
    pub user: String,
    pub year: i32,
    pub min_col: u32,
    pub max_col: u32,
    pub cells: Vec<ContributionCell>,
}

impl ContributionGrid {
    pub fn new(user: impl Into<String>, year: i32, cells: Vec<ContributionCell>) -> Self {
        let max_col = cells.iter().map(|cell| cell.col).max().unwrap_or(0);
        let min_col = cells.iter().map(|cell| cell.col).min().unwrap_or(max_col);
        Self {
            user: user.into(),
            year,
            min_col,
            max_col,
            cells,
        }
    }
}

/// Traffic totals for one query window of a Cloudflare zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficWindow {
    pub visits: u64,
    pub requests: u64,
    pub edge_response_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub unique_visitors: u64,
    pub requests: u64,
    pub edge_response_bytes: u64,
    pub window_hours: u32,
}

impl SiteStats {
    pub fn from_windows(windows: &[TrafficWindow], hours_per_window: u32) -> Self {
        windows.iter().fold(
            Self {
                window_hours: hours_per_window * windows.len() as u32,
                ..Self::default()
            },
            |acc, window| Self {
                unique_visitors: acc.unique_visitors + window.visits,
                requests: acc.requests + window.requests,
                edge_response_bytes: acc.edge_response_bytes + window.edge_response_bytes,
                window_hours: acc.window_hours,
            },
        )
    }
}
