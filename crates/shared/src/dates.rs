use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Compact timestamp format used by Moves exports, e.g. `20140512T083012+0300`.
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%S%z";

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Move a `YYYY-MM-DD` date by `days`.
pub fn shift_date(date: &str, days: i64) -> Option<String> {
    let d = parse_date(date)?.checked_add_signed(Duration::days(days))?;
    Some(d.format(DATE_FORMAT).to_string())
}

/// Parse either RFC3339 or the compact Moves timestamp.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt);
    }
    // %z does not accept a bare `Z`
    let normalized = match ts.strip_suffix('Z') {
        Some(head) => format!("{head}+0000"),
        None => ts.to_string(),
    };
    DateTime::parse_from_str(&normalized, COMPACT_FORMAT).ok()
}

/// Local calendar day of a timestamp, as `YYYY-MM-DD`.
pub fn date_of(ts: &str) -> Option<String> {
    parse_timestamp(ts).map(|dt| dt.date_naive().format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_date_across_month() {
        assert_eq!(shift_date("2014-05-31", 1).as_deref(), Some("2014-06-01"));
        assert_eq!(shift_date("2014-03-01", -1).as_deref(), Some("2014-02-28"));
    }

    #[test]
    fn test_shift_date_invalid() {
        assert!(shift_date("2014-13-01", 1).is_none());
        assert!(shift_date("yesterday", 1).is_none());
    }

    #[test]
    fn test_parse_compact_utc() {
        let dt = parse_timestamp("20140512T083012Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2014-05-12T08:30:12+00:00");
    }

    #[test]
    fn test_parse_compact_offset() {
        let dt = parse_timestamp("20140512T233012-0400").unwrap();
        assert_eq!(dt.to_rfc3339(), "2014-05-12T23:30:12-04:00");
    }

    #[test]
    fn test_date_of_keeps_local_day() {
        // Late evening in New York is already the next day in UTC
        assert_eq!(date_of("2014-05-12T23:30:12-04:00").as_deref(), Some("2014-05-12"));
        assert_eq!(date_of("20140512T083012Z").as_deref(), Some("2014-05-12"));
        assert!(date_of("not a time").is_none());
    }
}
