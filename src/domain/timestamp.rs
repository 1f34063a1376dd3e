//! Normalisation of client-supplied timestamps.
//!
//! Dashboards send dates in whatever shape the browser produced. Everything
//! is converted to a UTC instant with full precision; a bare date means
//! midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp in RFC 3339, naive date-time or date-only form.
///
/// Returns `None` when the input matches none of the accepted forms.
#[must_use]
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn keeps_time_of_day_from_rfc3339() {
        let parsed = parse_timestamp("2025-03-04T10:20:30.250Z").unwrap();
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 20);
        assert_eq!(parsed.second(), 30);
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn converts_offsets_to_utc() {
        let parsed = parse_timestamp("2025-03-04T07:00:00+07:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn accepts_sql_style_datetime() {
        let parsed = parse_timestamp("2026-01-31 23:59:58").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 58).unwrap());
    }

    #[test]
    fn date_only_means_midnight() {
        let parsed = parse_timestamp("2026-12-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2026-13-40").is_none());
    }
}
