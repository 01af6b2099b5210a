use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

/// Epoch milliseconds of the first UTC midnight strictly after `now_ms`.
pub fn next_utc_midnight_ms(now_ms: i64) -> i64 {
    let Some(now) = DateTime::<Utc>::from_timestamp_millis(now_ms) else {
        return now_ms;
    };
    now.date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .unwrap_or(now_ms)
}

/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, or a zone-less
/// `YYYY-MM-DDTHH:MM:SS` read as UTC.
pub fn parse_start_date(name: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(AppError::Config(format!(
        "{name} is not a valid date: {value:?}"
    )))
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
