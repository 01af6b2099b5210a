use std::sync::Arc;

use chrono::{Datelike, Utc};
use folio_core::ContributionGrid;
use folio_upstream::{GithubClient, parse_contribution_cells};
use tracing::debug;

use super::SharedConfig;
use super::activity::validate_github_user;
use crate::cache::TtlMap;
use crate::error::{AppError, Result};

/// Distinct (user, year) calendars cached at once.
const CACHED_CALENDARS: usize = 256;

#[derive(Clone)]
pub struct ContributionsService {
    config: SharedConfig,
    github: GithubClient,
    cache: Arc<TtlMap<(String, i32), ContributionGrid>>,
}

impl ContributionsService {
    pub(super) fn new(config: SharedConfig, github: GithubClient) -> Self {
        let cache = Arc::new(TtlMap::new(config.ttls.contributions, CACHED_CALENDARS));
        Self {
            config,
            github,
            cache,
        }
    }

    /// Contribution calendar for `user` (default: configured user) in `year`
    /// (default: current UTC year).
    pub async fn calendar(&self, user: Option<&str>, year: Option<i32>) -> Result<ContributionGrid> {
        let user = validate_github_user(user.unwrap_or(&self.config.github_user))?;
        let year = year.unwrap_or_else(|| Utc::now().year());
        let key = (user, year);
        if let Some(grid) = self.cache.fresh(&key) {
            debug!(user = %key.0, year, "contributions cache hit");
            return Ok(grid);
        }
        let html = self
            .github
            .contributions_html(&key.0, year)
            .await
            .map_err(|err| AppError::upstream("Failed to fetch GitHub contributions", err))?;
        let grid = ContributionGrid::new(key.0.clone(), year, parse_contribution_cells(&html));
        self.cache.store(key, grid.clone());
        Ok(grid)
    }
}

/// Reads the optional `year` query value.
pub fn parse_year(value: Option<&str>) -> Result<Option<i32>> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i32>() {
        Ok(year) if (1000..=9999).contains(&year) => Ok(Some(year)),
        _ => Err(AppError::InvalidInput(format!("invalid year {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_is_optional_but_numeric() {
        assert_eq!(parse_year(None).expect("none"), None);
        assert_eq!(parse_year(Some("")).expect("blank"), None);
        assert_eq!(parse_year(Some("2024")).expect("year"), Some(2024));
        assert!(matches!(parse_year(Some("twenty")), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_year(Some("99999")), Err(AppError::InvalidInput(_))));
    }
}
