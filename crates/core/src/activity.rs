use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{ActivityItem, ActivityKind};

/// Maximum number of items in an activity response.
pub const ACTIVITY_LIMIT: usize = 5;

/// Dedupes by id (first occurrence wins), orders newest first and truncates.
///
/// Items whose `created_at` is not RFC 3339 sort after every dated item.
pub fn finalize_activity(items: Vec<ActivityItem>, limit: usize) -> Vec<ActivityItem> {
    let mut seen = HashSet::new();
    let mut items: Vec<ActivityItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    items.sort_by_cached_key(|item| std::cmp::Reverse(created_at_millis(&item.created_at)));
    items.truncate(limit);
    items
}

pub fn placeholder_activity(user: &str, now: DateTime<Utc>) -> ActivityItem {
    ActivityItem {
        id: format!("{user}-profile"),
        kind: ActivityKind::Commit,
        title: format!("See {user} on GitHub"),
        url: format!("https://github.com/{user}"),
        repo: user.to_string(),
        created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Extracts `owner/name` from a `https://github.com/owner/name/...` link.
pub fn repo_from_github_url(url: &str) -> Option<String> {
    let (_, path) = url.split_once("github.com/")?;
    let mut segments = path.split(['/', '?', '#']).filter(|part| !part.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    Some(format!("{owner}/{name}"))
}

fn created_at_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.timestamp_millis())
}
