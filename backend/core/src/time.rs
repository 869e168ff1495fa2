//! Date helpers for reservation timestamps.
//!
//! The PMS encodes arrival/departure as epoch seconds pinned to midnight, so
//! most comparisons in the runtime are date-granular rather than
//! timestamp-granular.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

/// Convert an epoch-seconds stamp to a local calendar date.
pub fn epoch_to_local_date(ts: i64) -> Option<NaiveDate> {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0)?;
    Some(dt.with_timezone(&Local).date_naive())
}

/// Epoch bounds `[start, end]` of a local calendar day.
pub fn day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
        .earliest()
        .map(|dt| dt.timestamp())
        .unwrap_or(0);
    // Inclusive end of day.
    (start, start + 86_399)
}

/// Epoch seconds for UTC midnight of a date, as the PMS expects for
/// date-of-birth fields. Local-midnight conversion shifts the date by one
/// day for operators west of UTC.
pub fn date_to_utc_midnight_epoch(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
        .timestamp()
}

/// `DD.MM.YYYY`, or "N/A" for a missing stamp.
pub fn format_epoch_date(ts: i64) -> String {
    match epoch_to_local_date(ts) {
        Some(d) => format_date(d),
        None => "N/A".to_string(),
    }
}

/// `DD.MM.YYYY` for a calendar date.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{}", date.day(), date.month(), date.year())
}

/// `DD.MM` short form used in compact listings.
pub fn format_short(date: NaiveDate) -> String {
    format!("{:02}.{:02}", date.day(), date.month())
}

/// Parse a date in either `DD.MM.YYYY` or `YYYY-MM-DD` form.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_midnight_epoch_is_date_stable() {
        let date = NaiveDate::from_ymd_opt(1987, 6, 15).unwrap();
        let ts = date_to_utc_midnight_epoch(date);
        let back = DateTime::<Utc>::from_timestamp(ts, 0).unwrap().date_naive();
        assert_eq!(back, date);
        assert_eq!(ts % 86_400, 0);
    }

    #[test]
    fn day_bounds_cover_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(end - start, 86_399);
    }

    #[test]
    fn formats() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "05.01.2024");
        assert_eq!(format_short(date), "05.01");
    }

    #[test]
    fn parses_both_date_forms() {
        let expected = NaiveDate::from_ymd_opt(1990, 12, 24).unwrap();
        assert_eq!(parse_flexible_date("24.12.1990"), Some(expected));
        assert_eq!(parse_flexible_date("1990-12-24"), Some(expected));
        assert_eq!(parse_flexible_date("not a date"), None);
    }
}
