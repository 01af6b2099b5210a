use folio_app::{Result, parse_year};
use folio_core::{
    ActivityFeed, AnthropicUsageTotals, ContributionGrid, IssSnapshot, OpenAiUsageTotals, SiteStats,
};

use crate::{ActivityRequest, AppContext, ContributionsRequest, HealthResponse};

pub fn health(_ctx: &AppContext) -> HealthResponse {
    HealthResponse { status: "ok" }
}

pub async fn anthropic_usage(ctx: &AppContext) -> Result<AnthropicUsageTotals> {
    ctx.app_state.services.anthropic.totals().await
}

pub async fn openai_usage(ctx: &AppContext) -> Result<OpenAiUsageTotals> {
    ctx.app_state.services.openai.totals().await
}

pub async fn github_activity(ctx: &AppContext, req: ActivityRequest) -> Result<ActivityFeed> {
    ctx.app_state
        .services
        .activity
        .recent(req.user.as_deref())
        .await
}

pub async fn github_contributions(
    ctx: &AppContext,
    req: ContributionsRequest,
) -> Result<ContributionGrid> {
    let year = parse_year(req.year.as_deref())?;
    ctx.app_state
        .services
        .contributions
        .calendar(req.user.as_deref(), year)
        .await
}

pub async fn iss_position(ctx: &AppContext) -> Result<IssSnapshot> {
    ctx.app_state.services.iss.snapshot().await
}

pub async fn site_stats(ctx: &AppContext) -> Result<SiteStats> {
    ctx.app_state.services.stats.weekly().await
}
