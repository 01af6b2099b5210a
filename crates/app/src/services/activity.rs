use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use folio_core::{
    ACTIVITY_LIMIT, ActivityFeed, ActivityItem, finalize_activity, placeholder_activity,
};
use folio_upstream::{
    GithubClient, atom_items, commit_item, event_items, parse_atom_entries,
};
use futures::future::join_all;
use tracing::{debug, warn};

use super::SharedConfig;
use crate::cache::TtlMap;
use crate::error::{AppError, Result};

/// Repos inspected by the repo fallback, also its page size.
const REPO_FANOUT: usize = 12;

const MAX_USERNAME_LEN: usize = 39;

/// Distinct users whose feeds stay cached at once.
const CACHED_FEEDS: usize = 256;

#[derive(Clone)]
pub struct ActivityService {
    config: SharedConfig,
    github: GithubClient,
    cache: Arc<TtlMap<String, ActivityFeed>>,
}

impl ActivityService {
    pub(super) fn new(config: SharedConfig, github: GithubClient) -> Self {
        let cache = Arc::new(TtlMap::new(config.ttls.activity, CACHED_FEEDS));
        Self {
            config,
            github,
            cache,
        }
    }

    pub async fn recent(&self, user: Option<&str>) -> Result<ActivityFeed> {
        let user = validate_github_user(user.unwrap_or(&self.config.github_user))?;
        if let Some(feed) = self.cache.fresh(&user) {
            debug!(%user, "activity cache hit");
            return Ok(feed);
        }
        let items = self.collect(&user).await?;
        let feed = ActivityFeed { user, items };
        self.cache.store(feed.user.clone(), feed.clone());
        Ok(feed)
    }

    async fn collect(&self, user: &str) -> Result<Vec<ActivityItem>> {
        let mut items = self.from_events(user).await?;
        if items.len() < ACTIVITY_LIMIT {
            debug!(%user, found = items.len(), "falling back to recent repos");
            self.extend_from_repos(user, &mut items).await;
        }
        if items.is_empty() {
            debug!(%user, "falling back to the atom feed");
            items = self.from_atom_feed(user).await;
        }
        if items.is_empty() {
            items.push(placeholder_activity(user, Utc::now()));
        }
        Ok(finalize_activity(items, ACTIVITY_LIMIT))
    }

    async fn from_events(&self, user: &str) -> Result<Vec<ActivityItem>> {
        match self.github.public_events(user).await {
            Ok(events) => Ok(event_items(&events)),
            Err(err) if err.is_connect() => {
                Err(AppError::upstream("Failed to fetch GitHub activity", err))
            }
            Err(err) => {
                warn!(%user, "github events unavailable: {err}");
                Ok(Vec::new())
            }
        }
    }

    async fn extend_from_repos(&self, user: &str, items: &mut Vec<ActivityItem>) {
        let repos = match self.github.recent_repos(user, REPO_FANOUT).await {
            Ok(repos) => repos,
            Err(err) => {
                warn!(%user, "github repos unavailable: {err}");
                return;
            }
        };
        let lookups = repos.iter().take(REPO_FANOUT).map(|repo| async move {
            (
                repo.full_name.as_str(),
                self.github.latest_commit(&repo.full_name).await,
            )
        });
        let results = join_all(lookups).await;

        let mut seen: HashSet<String> = items.iter().map(|item| item.url.clone()).collect();
        let now = Utc::now();
        for (repo, result) in results {
            if items.len() >= ACTIVITY_LIMIT {
                break;
            }
            let commit = match result {
                Ok(Some(commit)) => commit,
                Ok(None) => continue,
                Err(err) => {
                    debug!(%repo, "latest commit unavailable: {err}");
                    continue;
                }
            };
            if seen.insert(commit.html_url.clone()) {
                items.push(commit_item(repo, &commit, now));
            }
        }
    }

    async fn from_atom_feed(&self, user: &str) -> Vec<ActivityItem> {
        let xml = match self.github.atom_feed(user).await {
            Ok(xml) => xml,
            Err(err) => {
                warn!(%user, "github atom feed unavailable: {err}");
                return Vec::new();
            }
        };
        match parse_atom_entries(&xml) {
            Ok(entries) => atom_items(&entries),
            Err(err) => {
                warn!(%user, "github atom feed unreadable: {err}");
                Vec::new()
            }
        }
    }
}

/// GitHub logins: 1-39 ASCII alphanumerics or single inner hyphens.
pub fn validate_github_user(user: &str) -> Result<String> {
    let user = user.trim();
    let valid = !user.is_empty()
        && user.len() <= MAX_USERNAME_LEN
        && user.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !user.starts_with('-')
        && !user.ends_with('-')
        && !user.contains("--");
    if valid {
        Ok(user.to_string())
    } else {
        Err(AppError::InvalidInput(format!("invalid GitHub user {user:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_real_logins() {
        assert_eq!(validate_github_user(" shokace ").expect("user"), "shokace");
        assert!(validate_github_user("octo-cat42").is_ok());
    }

    #[test]
    fn rejects_path_like_or_malformed_logins() {
        let long = "x".repeat(40);
        for bad in ["", "a/b", "../x", "-lead", "trail-", "two--dash", long.as_str()] {
            assert!(
                matches!(validate_github_user(bad), Err(AppError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
