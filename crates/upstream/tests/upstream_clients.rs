mod support;

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use folio_upstream::{
    AnthropicClient, CloudflareClient, GithubClient, IssClient, KvClient, KvCredentials,
    OpenAiClient, UpstreamError,
};
use support::{Hits, endpoints, http_client, spawn_upstream};

#[tokio::test]
async fn anthropic_follows_pagination_until_has_more_is_false() {
    let hits = Hits::default();
    let router = Router::new()
        .route(
            "/v1/organizations/usage_report/messages",
            get(
                |State(hits): State<Hits>, Query(query): Query<HashMap<String, String>>| async move {
                    hits.bump();
                    assert_eq!(query.get("bucket_width").map(String::as_str), Some("1h"));
                    match query.get("page").map(String::as_str) {
                        None => Json(json!({
                            "data": [{"results": [{"uncached_input_tokens": 100, "output_tokens": 10}]}],
                            "has_more": true,
                            "next_page": "p2"
                        })),
                        Some(_) => Json(json!({
                            "data": [{"results": [{
                                "uncached_input_tokens": 1,
                                "cache_read_input_tokens": 5,
                                "cache_creation": {"ephemeral_5m_input_tokens": 2, "ephemeral_1h_input_tokens": 3}
                            }]}],
                            "has_more": false,
                            "next_page": null
                        })),
                    }
                },
            ),
        )
        .with_state(hits.clone());
    let base = spawn_upstream(router).await;
    let client = AnthropicClient::new(http_client(), &endpoints(&base));

    let now = Utc::now();
    let counts = client
        .usage_counts("admin-key", now - Duration::days(30), now)
        .await
        .expect("usage");

    assert_eq!(hits.count(), 2);
    assert_eq!(counts.input_tokens, 101);
    assert_eq!(counts.output_tokens, 10);
    assert_eq!(counts.cache_read_tokens, 5);
    assert_eq!(counts.cache_creation_tokens, 5);
}

#[tokio::test]
async fn anthropic_rate_limit_body_maps_to_rate_limited() {
    let router = Router::new().route(
        "/v1/organizations/usage_report/messages",
        get(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"type": "error", "error": {"type": "rate_limit_error", "message": "later"}})),
            )
        }),
    );
    let base = spawn_upstream(router).await;
    let client = AnthropicClient::new(http_client(), &endpoints(&base));

    let now = Utc::now();
    let err = client
        .usage_counts("admin-key", now - Duration::days(1), now)
        .await
        .expect_err("rate limited");

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn openai_sums_requests_and_tokens() {
    let router = Router::new().route(
        "/v1/organization/usage/completions",
        get(|| async {
            Json(json!({
                "object": "page",
                "data": [
                    {"start_time": 0, "end_time": 1, "results": [
                        {"input_tokens": 10, "output_tokens": 4, "input_cached_tokens": 3, "num_model_requests": 2}
                    ]},
                    {"start_time": 1, "end_time": 2, "results": [
                        {"input_tokens": 5, "num_model_requests": 1}
                    ]}
                ],
                "has_more": false,
                "next_page": null
            }))
        }),
    );
    let base = spawn_upstream(router).await;
    let client = OpenAiClient::new(http_client(), &endpoints(&base));

    let now = Utc::now();
    let counts = client
        .usage_counts("admin-key", now - Duration::days(2), now)
        .await
        .expect("usage");

    assert_eq!(counts.requests, 3);
    assert_eq!(counts.input_tokens, 15);
    assert_eq!(counts.output_tokens, 4);
    assert_eq!(counts.cached_tokens, 3);
}

#[tokio::test]
async fn usage_walkers_stop_when_the_page_token_repeats() {
    let hits = Hits::default();
    let stuck = |State(hits): State<Hits>| async move {
        hits.bump();
        Json(json!({
            "data": [{"results": [{"input_tokens": 1, "uncached_input_tokens": 1}]}],
            "has_more": true,
            "next_page": "stuck"
        }))
    };
    let router = Router::new()
        .route("/v1/organizations/usage_report/messages", get(stuck))
        .route("/v1/organization/usage/completions", get(stuck))
        .with_state(hits.clone());
    let base = spawn_upstream(router).await;
    let now = Utc::now();

    let anthropic = AnthropicClient::new(http_client(), &endpoints(&base))
        .usage_counts("admin-key", now - Duration::days(1), now)
        .await
        .expect_err("stuck pagination");
    let openai = OpenAiClient::new(http_client(), &endpoints(&base))
        .usage_counts("admin-key", now - Duration::days(1), now)
        .await
        .expect_err("stuck pagination");

    assert!(matches!(anthropic, UpstreamError::Payload(_)));
    assert!(matches!(openai, UpstreamError::Payload(_)));
    assert_eq!(hits.count(), 4);
}

#[tokio::test]
async fn openai_429_is_rate_limited() {
    let router = Router::new().route(
        "/v1/organization/usage/completions",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = spawn_upstream(router).await;
    let client = OpenAiClient::new(http_client(), &endpoints(&base));

    let now = Utc::now();
    let err = client
        .usage_counts("admin-key", now - Duration::days(2), now)
        .await
        .expect_err("rate limited");

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn kv_get_missing_key_is_none_and_quota_errors_are_classified() {
    let router = Router::new()
        .route(
            "/get/:key",
            get(|Path(key): Path<String>| async move {
                assert_eq!(key, "iss:trail");
                Json(json!({"result": null}))
            }),
        )
        .route(
            "/set/:key",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "ERR max requests limit exceeded. Limit: 10000, Usage: 10000"})),
                )
            }),
        );
    let base = spawn_upstream(router).await;
    let kv = KvClient::new(
        http_client(),
        KvCredentials {
            url: base,
            token: "token".to_string(),
        },
    );

    assert_eq!(kv.get("iss:trail").await.expect("get"), None);
    let err = kv.set("iss:trail", "[]").await.expect_err("quota");
    assert!(err.is_quota_exceeded());
}

#[tokio::test]
async fn kv_round_trips_string_values() {
    let router = Router::new().route(
        "/get/:key",
        get(|| async { Json(json!({"result": "[{\"lat\":1.0,\"lon\":2.0,\"ts\":3}]"})) }),
    );
    let base = spawn_upstream(router).await;
    let kv = KvClient::new(
        http_client(),
        KvCredentials {
            url: base,
            token: "token".to_string(),
        },
    );

    let value = kv.get("iss:trail").await.expect("get").expect("value");
    let parsed: Value = serde_json::from_str(&value).expect("json");
    assert_eq!(parsed[0]["ts"], 3);
}

#[tokio::test]
async fn iss_non_success_message_is_an_error() {
    let router = Router::new().route(
        "/iss-now.json",
        get(|| async {
            Json(json!({"message": "failure", "timestamp": 1, "iss_position": {"latitude": "0", "longitude": "0"}}))
        }),
    );
    let base = spawn_upstream(router).await;
    let client = IssClient::new(http_client(), &endpoints(&base));

    let err = client.current_position().await.expect_err("failure");
    assert!(matches!(err, UpstreamError::Payload(_)));
}

#[tokio::test]
async fn cloudflare_graphql_errors_carry_details() {
    let router = Router::new().route(
        "/client/v4/graphql",
        post(|| async { Json(json!({"data": null, "errors": [{"message": "zone not found"}]})) }),
    );
    let base = spawn_upstream(router).await;
    let client = CloudflareClient::new(http_client(), &endpoints(&base));

    let err = client
        .daily_traffic("token", "zone", Utc::now(), 7)
        .await
        .expect_err("graphql error");

    let details = err.details().expect("details");
    assert_eq!(details[0]["message"], "zone not found");
}

#[tokio::test]
async fn cloudflare_sums_daily_windows() {
    let hits = Hits::default();
    let router = Router::new()
        .route(
            "/client/v4/graphql",
            post(|State(hits): State<Hits>, Json(body): Json<Value>| async move {
                hits.bump();
                assert_eq!(body["variables"]["zoneTag"], "zone");
                Json(json!({"data": {"viewer": {"zones": [{"httpRequestsAdaptiveGroups": [
                    {"count": 10, "sum": {"visits": 2, "edgeResponseBytes": 1000}}
                ]}]}}}))
            }),
        )
        .with_state(hits.clone());
    let base = spawn_upstream(router).await;
    let client = CloudflareClient::new(http_client(), &endpoints(&base));

    let windows = client
        .daily_traffic("token", "zone", Utc::now(), 7)
        .await
        .expect("traffic");

    assert_eq!(hits.count(), 7);
    assert_eq!(windows.iter().map(|w| w.requests).sum::<u64>(), 70);
}

#[tokio::test]
async fn github_latest_commit_and_contributions() {
    let router = Router::new()
        .route(
            "/repos/:owner/:name/commits",
            get(|Path((owner, name)): Path<(String, String)>| async move {
                Json(json!([{
                    "sha": "abc",
                    "html_url": format!("https://github.com/{owner}/{name}/commit/abc"),
                    "commit": {"message": "fix", "committer": {"date": "2025-01-01T00:00:00Z"}}
                }]))
            }),
        )
        .route(
            "/users/:user/contributions",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(query.get("from").map(String::as_str), Some("2024-01-01"));
                r#"<td data-date="2024-01-01" id="contribution-day-component-1-0" data-level="2" class="ContributionCalendar-day"></td>"#
            }),
        );
    let base = spawn_upstream(router).await;
    let client = GithubClient::new(http_client(), &endpoints(&base), None);

    let commit = client
        .latest_commit("octo/alpha")
        .await
        .expect("commit")
        .expect("some commit");
    assert_eq!(commit.html_url, "https://github.com/octo/alpha/commit/abc");

    let html = client.contributions_html("octo", 2024).await.expect("html");
    let cells = folio_upstream::parse_contribution_cells(&html);
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].level, 2);
}
