//! Date parsing for spreadsheet cells and the inclusive date window.
//!
//! Each format has its own parser returning `None` when the text does not
//! match, so every call site decides what "unparseable" means for it:
//!
//! | Parser          | Accepts                                   |
//! |-----------------|-------------------------------------------|
//! | [`parse_iso`]   | `2024-08-05`, `2024-08-05T09:30:00`       |
//! | [`parse_slash`] | `8/5/2024`, `08/05/2024 14:03:22`         |
//! | [`parse_serial`]| `45509`, `45509.25` (days since 1899-12-30) |
//!
//! Timestamps are naive wall-clock values in the configured fixed offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Largest serial Sheets accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parse `YYYY-MM-DD` with an optional time part.
pub fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local())
}

/// Parse month-first `M/D/YYYY` with an optional `H:MM[:SS]` time part.
pub fn parse_slash(text: &str) -> Option<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let date_part = parts.next()?;
    let time_part = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let numbers: Vec<&str> = date_part.split('/').collect();
    let [month, day, year] = numbers.as_slice() else {
        return None;
    };
    if year.len() != 4 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;

    let time = match time_part {
        Some(clock) => parse_clock(clock)?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    let fields: Vec<&str> = text.split(':').collect();
    let (hour, minute, second) = match fields.as_slice() {
        [h, m] => (h.parse().ok()?, m.parse().ok()?, 0),
        [h, m, s] => (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?),
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse a spreadsheet date serial (days since 1899-12-30, fraction = time of day).
pub fn parse_serial(text: &str) -> Option<NaiveDateTime> {
    let serial: f64 = text.trim().parse().ok()?;
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

/// Try ISO, then slash, then serial.
pub fn parse_any(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_iso(text)
        .or_else(|| parse_slash(text))
        .or_else(|| parse_serial(text))
}

/// Render as `MM/DD/YYYY`.
pub fn format_slash(ts: &NaiveDateTime) -> String {
    ts.format("%m/%d/%Y").to_string()
}

/// Build a fixed offset from whole hours east of UTC.
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

/// Inclusive `[start 00:00, end 23:59:59.999]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Swaps the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Window from request parameters; `None` unless both bounds parse.
    ///
    /// A bound is a plain `YYYY-MM-DD` date or an RFC 3339 instant, which is
    /// moved into `offset` before taking its calendar date.
    pub fn from_query(start: Option<&str>, end: Option<&str>, offset: FixedOffset) -> Option<Self> {
        let start = parse_bound(start?, offset)?;
        let end = parse_bound(end?, offset)?;
        Some(Self::new(start, end))
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let lower = self.start.and_time(NaiveTime::MIN);
        let upper = self
            .end
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or_else(|| self.end.and_time(NaiveTime::MIN));
        lower <= *ts && *ts <= upper
    }

    /// Parse `text` with `parser` and test it; unparseable text is outside.
    pub fn admits(&self, text: &str, parser: fn(&str) -> Option<NaiveDateTime>) -> bool {
        parser(text).is_some_and(|ts| self.contains(&ts))
    }
}

fn parse_bound(text: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&offset).date_naive());
    }
    parse_iso(text).map(|ts| ts.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plus8() -> FixedOffset {
        offset_from_hours(8).unwrap()
    }

    #[test]
    fn test_parse_iso() {
        assert_eq!(parse_iso("2024-08-05").unwrap().date(), date(2024, 8, 5));
        assert_eq!(
            parse_iso("2024-08-05T09:30:00").unwrap(),
            date(2024, 8, 5).and_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_iso("08/05/2024").is_none());
        assert!(parse_iso("2024-13-01").is_none());
    }

    #[test]
    fn test_parse_slash_month_first() {
        assert_eq!(parse_slash("8/1/2024").unwrap().date(), date(2024, 8, 1));
        assert_eq!(parse_slash("08/01/2024").unwrap().date(), date(2024, 8, 1));
        assert_eq!(
            parse_slash("8/1/2024 9:03:22").unwrap(),
            date(2024, 8, 1).and_hms_opt(9, 3, 22).unwrap()
        );
        assert!(parse_slash("13/01/2024").is_none());
        assert!(parse_slash("8/1/24").is_none());
        assert!(parse_slash("2024-08-01").is_none());
        assert!(parse_slash("").is_none());
    }

    #[test]
    fn test_parse_serial() {
        assert_eq!(parse_serial("45505").unwrap().date(), date(2024, 8, 1));
        assert_eq!(
            parse_serial("45505.5").unwrap(),
            date(2024, 8, 1).and_hms_opt(12, 0, 0).unwrap()
        );
        assert!(parse_serial("0").is_none());
        assert!(parse_serial("abc").is_none());
    }

    #[test]
    fn test_parse_any_order() {
        assert_eq!(parse_any("2024-08-05").unwrap().date(), date(2024, 8, 5));
        assert_eq!(parse_any("08/05/2024").unwrap().date(), date(2024, 8, 5));
        assert_eq!(parse_any("45509").unwrap().date(), date(2024, 8, 5));
        assert!(parse_any("   ").is_none());
        assert!(parse_any("yesterday").is_none());
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let window = DateWindow::new(date(2024, 8, 1), date(2024, 8, 7));
        assert!(window.contains(&date(2024, 8, 1).and_hms_opt(0, 0, 0).unwrap()));
        assert!(window.contains(&date(2024, 8, 7).and_hms_milli_opt(23, 59, 59, 999).unwrap()));
        assert!(!window.contains(&date(2024, 7, 31).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!window.contains(&date(2024, 8, 8).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_admits_key_win_dates() {
        let window = DateWindow::new(date(2024, 8, 1), date(2024, 8, 7));
        assert!(window.admits("2024-08-05", parse_any));
        assert!(!window.admits("2024-08-09", parse_any));
        assert!(!window.admits("soon", parse_any));
    }

    #[test]
    fn test_from_query_requires_both_bounds() {
        assert!(DateWindow::from_query(Some("2024-08-01"), None, plus8()).is_none());
        assert!(DateWindow::from_query(Some("2024-08-01"), Some("nope"), plus8()).is_none());
        let w = DateWindow::from_query(Some("2024-08-07"), Some("2024-08-01"), plus8()).unwrap();
        assert_eq!(w.start, date(2024, 8, 1));
        assert_eq!(w.end, date(2024, 8, 7));
    }

    #[test]
    fn test_from_query_applies_offset_to_instants() {
        // 16:30 UTC on the 31st is already the 1st in UTC+8.
        let w = DateWindow::from_query(
            Some("2024-07-31T16:30:00Z"),
            Some("2024-08-07T00:00:00Z"),
            plus8(),
        )
        .unwrap();
        assert_eq!(w.start, date(2024, 8, 1));
        assert_eq!(w.end, date(2024, 8, 7));
    }

    #[test]
    fn test_format_slash() {
        assert_eq!(format_slash(&parse_slash("8/1/2024 10:00").unwrap()), "08/01/2024");
    }
}
