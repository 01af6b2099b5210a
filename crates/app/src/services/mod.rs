mod activity;
mod contributions;
mod gate;
mod iss;
mod stats;
mod usage;

use std::sync::Arc;

use folio_upstream::{
    AnthropicClient, CloudflareClient, GithubClient, IssClient, KvClient, OpenAiClient,
    build_http_client,
};

use crate::config::AppConfig;
use crate::error::{AppError, Result};

pub use activity::{ActivityService, validate_github_user};
pub use contributions::{ContributionsService, parse_year};
pub use gate::WriteGate;
pub use iss::{IssService, decode_stored_trail};
pub use stats::{STATS_WINDOW_DAYS, StatsService};
pub use usage::{AnthropicUsageService, OpenAiUsageService};

type SharedConfig = Arc<AppConfig>;

/// Service registry for every dashboard feed.
#[derive(Clone)]
pub struct AppServices {
    pub iss: IssService,
    pub activity: ActivityService,
    pub anthropic: AnthropicUsageService,
    pub openai: OpenAiUsageService,
    pub contributions: ContributionsService,
    pub stats: StatsService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let shared: SharedConfig = Arc::new(config.clone());
        let http = build_http_client(config.upstream_timeout)
            .map_err(|err| AppError::Message(format!("build http client: {err}")))?;
        let endpoints = &config.endpoints;
        let github = GithubClient::new(http.clone(), endpoints, config.github_token.clone())
            .with_timeout(config.github_timeout);
        let store = config
            .kv
            .clone()
            .map(|credentials| KvClient::new(http.clone(), credentials));

        Ok(Self {
            iss: IssService::new(IssClient::new(http.clone(), endpoints), store),
            activity: ActivityService::new(shared.clone(), github.clone()),
            anthropic: AnthropicUsageService::new(
                shared.clone(),
                AnthropicClient::new(http.clone(), endpoints),
            ),
            openai: OpenAiUsageService::new(shared.clone(), OpenAiClient::new(http.clone(), endpoints)),
            contributions: ContributionsService::new(shared.clone(), github),
            stats: StatsService::new(shared, CloudflareClient::new(http, endpoints)),
        })
    }
}
