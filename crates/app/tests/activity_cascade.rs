mod support;

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use folio_app::AppError;
use folio_core::ActivityKind;
use serde_json::{Value, json};
use support::{Hits, closed_port, config_for, spawn_upstream, state};

#[derive(Clone, Default)]
struct Github {
    events: Option<Value>,
    repos: Option<Value>,
    atom: Option<String>,
    events_delay: Option<Duration>,
    event_hits: Hits,
    repo_hits: Hits,
    commit_hits: Hits,
    atom_hits: Hits,
}

impl Github {
    fn router(&self) -> Router {
        Router::new()
            .route("/users/:user/events/public", get(events))
            .route("/users/:user/repos", get(repos))
            .route("/repos/:owner/:name/commits", get(commits))
            .route("/:feed", get(atom))
            .with_state(self.clone())
    }
}

fn json_or_404(value: Option<Value>) -> Response {
    match value {
        Some(value) => Json(value).into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

async fn events(State(github): State<Github>) -> Response {
    github.event_hits.bump();
    if let Some(delay) = github.events_delay {
        tokio::time::sleep(delay).await;
    }
    json_or_404(github.events.clone())
}

async fn repos(State(github): State<Github>) -> Response {
    github.repo_hits.bump();
    json_or_404(github.repos.clone())
}

async fn commits(State(github): State<Github>, Path((owner, name)): Path<(String, String)>) -> Response {
    github.commit_hits.bump();
    if name == "empty" {
        return Json(json!([])).into_response();
    }
    if name == "broken" {
        return (StatusCode::CONFLICT, "Git Repository is empty.").into_response();
    }
    Json(json!([{
        "sha": format!("{name}-sha"),
        "html_url": format!("https://github.com/{owner}/{name}/commit/{name}-sha"),
        "commit": {
            "message": format!("update {name}"),
            "committer": { "date": format!("2025-02-0{}T00:00:00Z", name.len() % 9 + 1) }
        }
    }]))
    .into_response()
}

async fn atom(State(github): State<Github>, Path(feed): Path<String>) -> Response {
    github.atom_hits.bump();
    assert_eq!(feed, "octo.atom");
    match github.atom.clone() {
        Some(xml) => xml.into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn push_event(id: u32, day: u32, shas: &[&str]) -> Value {
    json!({
        "id": id.to_string(),
        "type": "PushEvent",
        "created_at": format!("2025-03-{day:02}T12:00:00Z"),
        "repo": { "name": "octo/alpha" },
        "payload": {
            "commits": shas.iter().map(|sha| json!({ "sha": sha, "message": format!("commit {sha}") })).collect::<Vec<_>>()
        }
    })
}

#[tokio::test]
async fn full_events_tier_skips_every_fallback() {
    let github = Github {
        events: Some(json!([
            push_event(1, 1, &["a1", "a2"]),
            push_event(2, 3, &["b1", "b2"]),
            {
                "id": "3", "type": "PullRequestEvent", "created_at": "2025-03-02T12:00:00Z",
                "repo": { "name": "octo/beta" },
                "payload": { "pull_request": { "html_url": "https://github.com/octo/beta/pull/9", "title": "Beta" } }
            },
            { "id": "4", "type": "WatchEvent", "created_at": "2025-03-04T12:00:00Z", "repo": { "name": "x/y" } }
        ])),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let feed = app.services.activity.recent(None).await.expect("activity");

    assert_eq!(feed.user, "octo");
    assert_eq!(feed.items.len(), 5);
    assert_eq!(github.repo_hits.count(), 0);
    assert_eq!(github.atom_hits.count(), 0);
    assert!(feed.items[..2].iter().all(|item| item.created_at.starts_with("2025-03-03")));
    assert_eq!(feed.items[2].kind, ActivityKind::PullRequest);
    for pair in feed.items.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn sparse_events_are_topped_up_from_repos() {
    let github = Github {
        events: Some(json!([push_event(1, 1, &["alpha-sha"])])),
        repos: Some(json!([
            { "full_name": "octo/alpha" },
            { "full_name": "octo/empty" },
            { "full_name": "octo/broken" },
            { "full_name": "octo/gamma" }
        ])),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let feed = app.services.activity.recent(Some("octo")).await.expect("activity");

    let urls: Vec<&str> = feed.items.iter().map(|item| item.url.as_str()).collect();
    assert_eq!(feed.items.len(), 2);
    assert!(urls.contains(&"https://github.com/octo/alpha/commit/alpha-sha"));
    assert!(urls.contains(&"https://github.com/octo/gamma/commit/gamma-sha"));
    assert_eq!(github.commit_hits.count(), 4);
    assert_eq!(github.atom_hits.count(), 0);
}

#[tokio::test]
async fn failing_events_fall_back_to_repo_commits() {
    let github = Github {
        repos: Some(json!([{ "full_name": "octo/delta" }])),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let feed = app.services.activity.recent(None).await.expect("activity");

    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].repo, "octo/delta");
    assert_eq!(feed.items[0].id, "octo/delta-delta-sha");
    assert_eq!(github.event_hits.count(), 1);
}

#[tokio::test]
async fn empty_api_tiers_fall_through_to_the_atom_feed() {
    let github = Github {
        events: Some(json!([])),
        repos: Some(json!([])),
        atom: Some(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>tag:github.com,2008:PullRequestEvent/7</id>
    <published>2025-01-05T00:00:00Z</published>
    <link type="text/html" rel="alternate" href="https://github.com/octo/web/pull/3"/>
    <title>octo opened a pull request in octo/web &amp; more</title>
  </entry>
</feed>"#
                .to_string(),
        ),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let feed = app.services.activity.recent(None).await.expect("activity");

    assert_eq!(github.atom_hits.count(), 1);
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].kind, ActivityKind::PullRequest);
    assert_eq!(feed.items[0].repo, "octo/web");
    assert_eq!(feed.items[0].title, "octo opened a pull request in octo/web & more");
}

#[tokio::test]
async fn nothing_anywhere_yields_one_placeholder() {
    let github = Github::default();
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let feed = app.services.activity.recent(None).await.expect("activity");

    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].url, "https://github.com/octo");
    assert_eq!(github.atom_hits.count(), 1);
}

#[tokio::test]
async fn slow_events_api_counts_as_an_empty_tier() {
    let github = Github {
        events: Some(json!([push_event(1, 1, &["late"])])),
        events_delay: Some(Duration::from_secs(3)),
        repos: Some(json!([{ "full_name": "octo/delta" }])),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base).with_github_timeout(Duration::from_millis(200)));

    let feed = app.services.activity.recent(None).await.expect("activity");

    assert_eq!(github.event_hits.count(), 1);
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].id, "octo/delta-delta-sha");
}

#[tokio::test]
async fn unreachable_events_api_is_an_upstream_error() {
    let app = state(config_for(&closed_port().await));

    let err = app.services.activity.recent(None).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream { .. }));
}

#[tokio::test]
async fn feeds_are_cached_per_user() {
    let github = Github {
        events: Some(json!([push_event(1, 1, &["a", "b", "c", "d", "e"])])),
        ..Github::default()
    };
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let first = app.services.activity.recent(None).await.expect("first");
    let second = app.services.activity.recent(Some("octo")).await.expect("second");
    app.services.activity.recent(Some("other")).await.expect("other user");

    assert_eq!(first, second);
    assert_eq!(github.event_hits.count(), 2);
}

#[tokio::test]
async fn malformed_user_never_reaches_github() {
    let github = Github::default();
    let base = spawn_upstream(github.router()).await;
    let app = state(config_for(&base));

    let err = app.services.activity.recent(Some("../admin")).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(github.event_hits.count(), 0);
}
