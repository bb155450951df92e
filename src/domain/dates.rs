//! Lenient timestamp parsing for record date fields.
//!
//! Records arrive from files the app did not produce, so date fields may
//! be full RFC 3339 instants, naive datetimes, or bare dates. Anything
//! else is treated as unparseable and the caller decides what to exclude.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse a record date field, accepting RFC 3339, `YYYY-MM-DDTHH:MM:SS`
/// and bare `YYYY-MM-DD` (midnight UTC). Returns `None` when the value
/// does not parse.
pub fn parse_loose_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    None
}

/// Human-oriented date rendering for the presentation formats. Falls back
/// to the raw string when it does not parse.
pub fn format_display_date(raw: &str) -> String {
    match parse_loose_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}
