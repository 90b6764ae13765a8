// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! Step days are calendar days in the user's timezone, approximated by a
//! fixed per-profile minute offset from UTC.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current RFC3339 timestamp.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// The calendar date "today" for a user with the given offset from UTC.
pub fn today_for_offset(tz_offset_minutes: i32) -> NaiveDate {
    (Utc::now() + Duration::minutes(tz_offset_minutes as i64)).date_naive()
}

/// Render a date as the `YYYY-MM-DD` key used in document ids and columns.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key back to a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Extract the `YYYY-MM-DD` date part from an RFC3339 timestamp.
pub fn date_part(timestamp: &str) -> Option<&str> {
    if timestamp.len() >= 10 {
        Some(&timestamp[..10])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let key = date_key(date);
        assert_eq!(key, "2024-01-05");
        assert_eq!(parse_date_key(&key), Some(date));
    }

    #[test]
    fn test_date_part_of_timestamp() {
        assert_eq!(date_part("2024-01-15T10:30:00Z"), Some("2024-01-15"));
        assert_eq!(date_part("2024-01-15"), Some("2024-01-15"));
        assert_eq!(date_part("short"), None);
    }

    #[test]
    fn test_offset_shifts_day() {
        // Arithmetic sanity: +/- 24h always moves the date by one.
        let base = today_for_offset(0);
        let ahead = today_for_offset(24 * 60);
        let behind = today_for_offset(-24 * 60);
        assert_eq!(ahead, base.succ_opt().unwrap());
        assert_eq!(behind, base.pred_opt().unwrap());
    }
}
