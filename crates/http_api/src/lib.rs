mod errors;
mod handlers;
mod middleware;
mod state;

use std::time::Duration;

use axum::http::{Method, header::CONTENT_TYPE};
use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use errors::HttpError;
pub use state::HttpState;

pub fn router(state: HttpState) -> Router<()> {
    let live = Router::new()
        .route("/iss", get(handlers::iss_position))
        .route_layer(axum_middleware::from_fn(middleware::no_store));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/anthropic/usage", get(handlers::anthropic_usage))
        .route("/openai/usage", get(handlers::openai_usage))
        .route("/github/activity", get(handlers::github_activity))
        .route("/github/contributions", get(handlers::github_contributions))
        .route("/neverlanding/stats", get(handlers::site_stats))
        .merge(live);

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}
