//! Time-windowed ISS position trail.
//!
//! All functions take `now_ms` explicitly so the window and cooldown rules can
//! be evaluated against any clock.

use std::collections::HashSet;

use crate::TrailPoint;

/// Points older than this, relative to now, are dropped.
pub const TRAIL_WINDOW_MS: i64 = 30 * 60 * 1000;

/// Minimum spacing between two appended points.
pub const TRAIL_WRITE_COOLDOWN_MS: i64 = 2 * 60 * 1000;

/// Key of the single key-value entry holding the persisted trail.
pub const TRAIL_STORE_KEY: &str = "iss:trail";

#[derive(Debug, Clone, PartialEq)]
pub struct TrailUpdate {
    pub points: Vec<TrailPoint>,
    pub appended: bool,
}

/// Saturates so stored timestamps at the edges of `i64` stay ordered.
fn age_ms(point: &TrailPoint, now_ms: i64) -> i64 {
    now_ms.saturating_sub(point.ts)
}

pub fn prune_trail(points: Vec<TrailPoint>, now_ms: i64) -> Vec<TrailPoint> {
    points
        .into_iter()
        .filter(|point| age_ms(point, now_ms) <= TRAIL_WINDOW_MS)
        .collect()
}

/// Deduplicates by `(ts, lat, lon)`, orders by timestamp and prunes.
pub fn merge_trail(points: impl IntoIterator<Item = TrailPoint>, now_ms: i64) -> Vec<TrailPoint> {
    let mut seen = HashSet::new();
    let mut merged: Vec<TrailPoint> = points
        .into_iter()
        .filter(|point| point.lat.is_finite() && point.lon.is_finite())
        .filter(|point| seen.insert(point.key()))
        .collect();
    merged.sort_by_key(|point| point.ts);
    prune_trail(merged, now_ms)
}

pub fn should_append(last: Option<&TrailPoint>, lat: f64, lon: f64, now_ms: i64) -> bool {
    let Some(last) = last else {
        return true;
    };
    if last.lat.to_bits() == lat.to_bits() && last.lon.to_bits() == lon.to_bits() {
        return false;
    }
    age_ms(last, now_ms) >= TRAIL_WRITE_COOLDOWN_MS
}

/// Folds a freshly observed position into a stored trail.
pub fn advance_trail(stored: Vec<TrailPoint>, lat: f64, lon: f64, now_ms: i64) -> TrailUpdate {
    let mut points = merge_trail(stored, now_ms);
    let appended = should_append(points.last(), lat, lon, now_ms);
    if appended {
        points.push(TrailPoint {
            lat,
            lon,
            ts: now_ms,
        });
    }
    TrailUpdate {
        points: prune_trail(points, now_ms),
        appended,
    }
}
