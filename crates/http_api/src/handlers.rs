use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use app_api::{ActivityRequest, ContributionsRequest};

use crate::{errors::HttpError, state::HttpState};

pub async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    Json(app_api::health(&state.context))
}

pub async fn anthropic_usage(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::anthropic_usage(&state.context).await?;
    Ok(Json(response))
}

pub async fn openai_usage(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::openai_usage(&state.context).await?;
    Ok(Json(response))
}

pub async fn github_activity(
    State(state): State<HttpState>,
    Query(req): Query<ActivityRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::github_activity(&state.context, req).await?;
    Ok(Json(response))
}

pub async fn github_contributions(
    State(state): State<HttpState>,
    Query(req): Query<ContributionsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::github_contributions(&state.context, req).await?;
    Ok(Json(response))
}

pub async fn iss_position(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::iss_position(&state.context).await?;
    Ok(Json(response))
}

pub async fn site_stats(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::site_stats(&state.context).await?;
    Ok(Json(response))
}

pub async fn not_found() -> HttpError {
    HttpError::new(
        StatusCode::NOT_FOUND,
        "not found",
        Some("not_found".to_string()),
    )
}
