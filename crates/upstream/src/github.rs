use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::{ActivityItem, ActivityKind};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::{decode_json, ensure_success, join_url};
use crate::error::Result;
use crate::UpstreamEndpoints;

/// Default cap on every GitHub round trip.
pub const GITHUB_TIMEOUT: Duration = Duration::from_secs(4);

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    pub repo: EventRepo,
    #[serde(default)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushCommit {
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub html_url: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepo {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    pub date: Option<String>,
}

impl GithubCommit {
    pub fn date(&self) -> Option<&str> {
        self.commit
            .committer
            .as_ref()
            .and_then(|sig| sig.date.as_deref())
            .or_else(|| self.commit.author.as_ref().and_then(|sig| sig.date.as_deref()))
    }
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    web_base: String,
    token: Option<String>,
    timeout: Duration,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, endpoints: &UpstreamEndpoints, token: Option<String>) -> Self {
        Self {
            http,
            api_base: endpoints.github_api.clone(),
            web_base: endpoints.github_web.clone(),
            token,
            timeout: GITHUB_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_get(&self, path: &str) -> RequestBuilder {
        let request = self
            .http
            .get(join_url(&self.api_base, path))
            .header("Accept", GITHUB_ACCEPT)
            .timeout(self.timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn web_get(&self, path: &str, accept: &str) -> RequestBuilder {
        self.http
            .get(join_url(&self.web_base, path))
            .header("Accept", accept)
            .timeout(self.timeout)
    }

    /// Public events, newest first. Events with an unfamiliar shape are skipped.
    pub async fn public_events(&self, user: &str) -> Result<Vec<GithubEvent>> {
        let response = self
            .api_get(&format!("users/{user}/events/public"))
            .send()
            .await?;
        let raw: Vec<Value> = decode_json(response).await?;
        let events = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<GithubEvent>(value) {
                Ok(event) => Some(event),
                Err(err) => {
                    debug!("skipping github event: {err}");
                    None
                }
            })
            .collect();
        Ok(events)
    }

    pub async fn recent_repos(&self, user: &str, per_page: usize) -> Result<Vec<GithubRepo>> {
        let response = self
            .api_get(&format!("users/{user}/repos"))
            .query(&[("sort", "updated".to_string()), ("per_page", per_page.to_string())])
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn latest_commit(&self, full_name: &str) -> Result<Option<GithubCommit>> {
        let response = self
            .api_get(&format!("repos/{full_name}/commits"))
            .query(&[("per_page", "1")])
            .send()
            .await?;
        let commits: Vec<GithubCommit> = decode_json(response).await?;
        Ok(commits.into_iter().next())
    }

    pub async fn atom_feed(&self, user: &str) -> Result<String> {
        let response = self
            .web_get(&format!("{user}.atom"), "application/atom+xml")
            .send()
            .await?;
        Ok(ensure_success(response).await?.text().await?)
    }

    pub async fn contributions_html(&self, user: &str, year: i32) -> Result<String> {
        let response = self
            .web_get(&format!("users/{user}/contributions"), "text/html")
            .header("X-Requested-With", "XMLHttpRequest")
            .query(&[("from", format!("{year}-01-01")), ("to", format!("{year}-12-31"))])
            .send()
            .await?;
        Ok(ensure_success(response).await?.text().await?)
    }
}

/// One item per pushed commit and one per pull request event.
pub fn event_items(events: &[GithubEvent]) -> Vec<ActivityItem> {
    let mut items = Vec::new();
    for event in events {
        match event.kind.as_str() {
            "PushEvent" => {
                for commit in &event.payload.commits {
                    items.push(ActivityItem {
                        id: format!("{}-{}", event.id, commit.sha),
                        kind: ActivityKind::Commit,
                        title: commit.message.clone(),
                        url: format!("https://github.com/{}/commit/{}", event.repo.name, commit.sha),
                        repo: event.repo.name.clone(),
                        created_at: event.created_at.clone(),
                    });
                }
            }
            "PullRequestEvent" => {
                if let Some(pr) = &event.payload.pull_request {
                    items.push(ActivityItem {
                        id: format!("{}-pr", event.id),
                        kind: ActivityKind::PullRequest,
                        title: pr.title.clone(),
                        url: pr.html_url.clone(),
                        repo: event.repo.name.clone(),
                        created_at: event.created_at.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    items
}

pub fn commit_item(repo: &str, commit: &GithubCommit, now: DateTime<Utc>) -> ActivityItem {
    let created_at = commit
        .date()
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
    ActivityItem {
        id: format!("{repo}-{}", commit.sha),
        kind: ActivityKind::Commit,
        title: commit.commit.message.clone(),
        url: commit.html_url.clone(),
        repo: repo.to_string(),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_fixture() -> Vec<GithubEvent> {
        let raw = r#"[
            {"id":"1","type":"PushEvent","created_at":"2025-02-01T10:00:00Z",
             "repo":{"name":"octo/alpha"},
             "payload":{"commits":[{"sha":"aaa","message":"first"},{"sha":"bbb","message":"second"}]}},
            {"id":"2","type":"PullRequestEvent","created_at":"2025-02-02T10:00:00Z",
             "repo":{"name":"octo/beta"},
             "payload":{"action":"opened","pull_request":{"html_url":"https://github.com/octo/beta/pull/7","title":"Add beta"}}},
            {"id":"3","type":"WatchEvent","created_at":"2025-02-03T10:00:00Z",
             "repo":{"name":"octo/gamma"},"payload":{"action":"started"}}
        ]"#;
        serde_json::from_str(raw).expect("fixture")
    }

    #[test]
    fn push_and_pull_request_events_become_items() {
        let items = event_items(&events_fixture());

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "1-aaa");
        assert_eq!(items[0].url, "https://github.com/octo/alpha/commit/aaa");
        assert_eq!(items[1].title, "second");
        assert_eq!(items[2].kind, ActivityKind::PullRequest);
        assert_eq!(items[2].id, "2-pr");
        assert_eq!(items[2].repo, "octo/beta");
    }

    #[test]
    fn commit_item_prefers_committer_date() {
        let commit: GithubCommit = serde_json::from_str(
            r#"{"sha":"abc","html_url":"https://github.com/octo/a/commit/abc",
                "commit":{"message":"msg",
                  "author":{"date":"2025-01-01T00:00:00Z"},
                  "committer":{"date":"2025-01-02T00:00:00Z"}}}"#,
        )
        .expect("commit");

        let item = commit_item("octo/a", &commit, Utc::now());

        assert_eq!(item.created_at, "2025-01-02T00:00:00Z");
        assert_eq!(item.id, "octo/a-abc");
    }

    #[test]
    fn commit_item_falls_back_to_now() {
        let commit: GithubCommit = serde_json::from_str(
            r#"{"sha":"abc","html_url":"u","commit":{"message":"msg"}}"#,
        )
        .expect("commit");
        let now = DateTime::parse_from_rfc3339("2025-03-03T03:03:03Z")
            .expect("now")
            .with_timezone(&Utc);

        let item = commit_item("octo/a", &commit, now);

        assert_eq!(item.created_at, "2025-03-03T03:03:03Z");
    }
}
