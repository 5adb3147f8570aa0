//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert seconds to duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}

/// Extract the UTC calendar date from a track timestamp
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`, `2024-01-01T10:00:00+02:00`),
/// naive date-times (`2024-01-01T10:00:00`, `2024-01-01 10:00:00.123`,
/// read as UTC) and bare dates (`2024-01-01`). Returns `None` otherwise.
pub fn calendar_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").ok()
}

/// Format a date as `M/D/YYYY` without zero padding (e.g. `1/1/2024`)
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(0), Duration::ZERO);
        assert_eq!(secs_to_duration(30), Duration::from_secs(30));
    }

    #[test]
    fn test_calendar_date_rfc3339_utc() {
        let date = calendar_date("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_calendar_date_offset_normalized_to_utc() {
        // 01:30 at +02:00 is still the previous day in UTC
        let date = calendar_date("2024-03-10T01:30:00+02:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_calendar_date_naive_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(calendar_date("2023-12-31T23:59:59"), Some(expected));
        assert_eq!(calendar_date("2023-12-31 08:00:00.250"), Some(expected));
        assert_eq!(calendar_date("2023-12-31"), Some(expected));
    }

    #[test]
    fn test_calendar_date_rejects_garbage() {
        assert_eq!(calendar_date("yesterday"), None);
        assert_eq!(calendar_date(""), None);
    }

    #[test]
    fn test_display_date_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(display_date(date), "1/1/2024");

        let date = NaiveDate::from_ymd_opt(2024, 11, 25).unwrap();
        assert_eq!(display_date(date), "11/25/2024");
    }
}
