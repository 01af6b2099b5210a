use std::collections::HashMap;
use std::sync::LazyLock;

use folio_core::ContributionCell;
use regex::Regex;

static CELL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td[^>]*class="[^"]*ContributionCalendar-day[^"]*"[^>]*>"#)
        .expect("cell tag pattern")
});
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z0-9:-]+)="([^"]*)""#).expect("attribute pattern"));
static CELL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"contribution-day-component-(\d+)-(\d+)").expect("cell id pattern")
});

/// Reads the calendar cells out of GitHub's contribution fragment.
///
/// Cells without a `data-date` or a positional id are skipped; a missing or
/// non-numeric `data-level` counts as 0.
pub fn parse_contribution_cells(html: &str) -> Vec<ContributionCell> {
    CELL_TAG
        .find_iter(html)
        .filter_map(|tag| parse_cell(tag.as_str()))
        .collect()
}

fn parse_cell(tag: &str) -> Option<ContributionCell> {
    let attrs: HashMap<&str, &str> = ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();
    let date = attrs.get("data-date").filter(|date| !date.is_empty())?;
    let position = CELL_ID.captures(attrs.get("id")?)?;
    let row = position.get(1)?.as_str().parse().ok()?;
    let col = position.get(2)?.as_str().parse().ok()?;
    let level = attrs
        .get("data-level")
        .and_then(|level| level.parse().ok())
        .unwrap_or(0);
    Some(ContributionCell {
        date: date.to_string(),
        level,
        row,
        col,
    })
}
