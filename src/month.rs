//! Month label normalization for the reporting-period column.

use crate::sheet_parser::Cell;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const SERIAL_UNIX_OFFSET_DAYS: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// Earliest year accepted from text.
const MIN_TEXT_YEAR: i32 = 1000;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Month-and-year formats, parsed with a day appended. Dashed labels such as
/// `Mar-24` come first, two-digit year before four.
const MONTH_FORMATS: &[&str] = &[
    "%b-%y",
    "%b-%Y",
    "%B-%Y",
    "%Y-%m",
    "%Y/%m",
    "%B %Y",
    "%b %Y",
    "%m/%Y",
];

/// Normalize a month cell to a `Mon-YY` label.
///
/// Blank cells give an empty string. Numbers strictly between 1900 and 2100
/// are bare years and pass through as text; other numbers are spreadsheet
/// date serials. Text that does not read as a date (e.g. `Q1 2024`) passes
/// through trimmed.
pub fn normalize_month(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number(n) => {
            if *n > 1900.0 && *n < 2100.0 {
                return cell.to_text();
            }
            serial_to_date(*n)
                .map(month_label)
                .unwrap_or_else(|| cell.to_text())
        }
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            parse_date_text(trimmed)
                .map(month_label)
                .unwrap_or_else(|| trimmed.to_string())
        }
        Cell::Bool(_) => cell.to_text(),
    }
}

/// Convert a spreadsheet serial to a UTC calendar date.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - SERIAL_UNIX_OFFSET_DAYS) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

/// Read free text as a calendar date, trying the common spreadsheet export
/// layouts. Time zones are ignored: the calendar date as written is kept.
///
/// chrono's `%Y` accepts a signed year of any width, so signed text is
/// rejected and every layout must yield a year from 1000 on.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.starts_with(['-', '+']) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return plausible(dt.naive_utc().date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return plausible(dt.naive_utc().date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok().and_then(plausible))
    {
        return Some(date);
    }
    if let Some(date) = DATETIME_FORMATS.iter().find_map(|f| {
        NaiveDateTime::parse_from_str(text, f)
            .ok()
            .and_then(|dt| plausible(dt.date()))
    }) {
        return Some(date);
    }

    let with_day = format!("{} 1", text);
    if let Some(date) = MONTH_FORMATS.iter().find_map(|f| {
        NaiveDate::parse_from_str(&with_day, &format!("{} %d", f))
            .ok()
            .and_then(plausible)
    }) {
        return Some(date);
    }

    // A four-digit year typed as text reads as January of that year.
    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = text.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).and_then(plausible);
    }

    None
}

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= MIN_TEXT_YEAR).then_some(date)
}

/// Render a date as `Mon-YY`.
pub fn month_label(date: NaiveDate) -> String {
    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    format!("{}-{:02}", month, date.year().rem_euclid(100))
}
