//! Timestamp utilities
//!
//! Date parsing for spreadsheet cells: Excel serial numbers, ISO strings and
//! the day-first formats the maintenance portal exports.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

/// Formats tried, in order, for textual dates
const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_ONLY_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Current local wall-clock time
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert an Excel serial date (1900 date system) to a timestamp
///
/// Serial 1 is 1900-01-01; the epoch is shifted to 1899-12-30 to absorb
/// Excel's phantom 1900-02-29.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Excel serial date (1900 date system) for a timestamp
pub fn datetime_to_excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

/// Repair common date typos before parsing
///
/// Dashes become slashes for day-first dates, two-digit years gain the
/// century, and a bare date gains midnight.
pub fn fix_date_format(raw: &str) -> String {
    let mut s = raw.trim().to_string();

    let looks_day_first = s
        .split(['-', '/'])
        .next()
        .map(|first| first.len() <= 2)
        .unwrap_or(false);
    if looks_day_first {
        s = s.replace('-', "/");
    }

    if s.len() == 8 && s.matches('/').count() == 2 {
        let parts: Vec<&str> = s.split('/').collect();
        if parts[2].len() == 2 {
            s = format!("{}/{}/20{}", parts[0], parts[1], parts[2]);
        }
    }

    if s.len() == 10 && s.contains('/') {
        s.push_str(" 00:00:00");
    }

    s
}

/// Parse a textual date in any of the accepted formats
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Repaired form first: "%Y" would happily read "24" as the year 24
    let repaired = fix_date_format(trimmed);
    try_formats(&repaired).or_else(|| try_formats(trimmed))
}

fn try_formats(s: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_ONLY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// `dd/mm/YYYY` rendering used across the dashboard
pub fn format_date_br(dt: &NaiveDateTime) -> String {
    dt.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_now_is_recent() {
        // After 2020-01-01, before 2100-01-01
        let n = now();
        assert!(n > dt(2020, 1, 1, 0, 0, 0));
        assert!(n < dt(2100, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_excel_serial_conversion() {
        assert_eq!(excel_serial_to_datetime(45901.0), Some(dt(2025, 9, 1, 0, 0, 0)));
        assert_eq!(excel_serial_to_datetime(45901.5), Some(dt(2025, 9, 1, 12, 0, 0)));
        assert_eq!(excel_serial_to_datetime(-1.0), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
        assert_eq!(datetime_to_excel_serial(&dt(2025, 9, 1, 12, 0, 0)), 45901.5);
    }

    #[test]
    fn test_parse_portal_format() {
        assert_eq!(
            parse_datetime("01/09/2025 00:00:00"),
            Some(dt(2025, 9, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("15/03/2024 14:05"),
            Some(dt(2024, 3, 15, 14, 5, 0))
        );
    }

    #[test]
    fn test_parse_iso_and_date_only() {
        assert_eq!(
            parse_datetime("2024-03-15T10:20:30"),
            Some(dt(2024, 3, 15, 10, 20, 30))
        );
        assert_eq!(parse_datetime("2024-03-15"), Some(dt(2024, 3, 15, 0, 0, 0)));
        assert_eq!(parse_datetime("15/03/2024"), Some(dt(2024, 3, 15, 0, 0, 0)));
    }

    #[test]
    fn test_parse_repairs_typos() {
        assert_eq!(parse_datetime("15-03-2024"), Some(dt(2024, 3, 15, 0, 0, 0)));
        assert_eq!(parse_datetime("15/03/24"), Some(dt(2024, 3, 15, 0, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("NaT"), None);
        assert_eq!(parse_datetime("32/13/2024"), None);
    }

    #[test]
    fn test_fix_date_format() {
        assert_eq!(fix_date_format(" 01-02-2024 "), "01/02/2024 00:00:00");
        assert_eq!(fix_date_format("01/02/24"), "01/02/2024 00:00:00");
        assert_eq!(fix_date_format("2024-02-01"), "2024-02-01");
    }
}
