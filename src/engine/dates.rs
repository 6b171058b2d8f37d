use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::EngineError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a calendar date. Timestamps are accepted and truncated to their date.
pub fn parse_date(input: &str) -> Result<NaiveDate, EngineError> {
    let s = input.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(EngineError::InvalidDate(input.to_string()))
}

/// Parse every value, failing on the first one that is not a date.
pub fn parse_dates<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<NaiveDate>, EngineError> {
    inputs.iter().map(|s| parse_date(s.as_ref())).collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Whole days from `earlier` to `later`. Negative when `later` is before `earlier`.
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Deduplicate and sort most recent first.
pub fn normalize(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}
