//! Date canonicalization for booking check-in/check-out columns.
//!
//! Accepted layouts, tried in this order:
//! - `YYYY-MM-DD` (already canonical)
//! - `D/M/YYYY`, then `M/D/YYYY` when the day-first reading is not a real date
//! - `D-M-YYYY`, then `M-D-YYYY`, only when the first segment has at most two digits
//!
//! Ambiguous values such as `03/04/2025` resolve day-first.

use chrono::NaiveDate;
use thiserror::Error;

/// Output layout every accepted date is rewritten to.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a raw date value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date value is empty")]
    Empty,
    #[error("'{0}' is not a valid calendar date")]
    Unrecognized(String),
}

/// Parses a raw date column value into a calendar date.
///
/// Surrounding whitespace and quote characters are ignored.
pub fn canonicalize_date(raw: &str) -> Result<NaiveDate, DateError> {
    let value = strip_value(raw);
    if value.is_empty() {
        return Err(DateError::Empty);
    }

    if let Some(date) = parse_canonical(value) {
        return Ok(date);
    }

    // Both separators share the same segment rules, so a dash date only gets
    // here when its first segment is one or two digits.
    ['/', '-']
        .into_iter()
        .find_map(|separator| split_numeric(value, separator))
        .and_then(|[first, second, year]| {
            day_first(first, second, year).or_else(|| month_first(first, second, year))
        })
        .ok_or_else(|| DateError::Unrecognized(value.to_string()))
}

/// Formats a date in the canonical `YYYY-MM-DD` layout.
pub fn format_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

fn strip_value(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
}

/// Accepts only the exact `YYYY-MM-DD` shape; chrono alone would also take
/// unpadded months and days.
fn parse_canonical(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT).ok()
}

/// Splits `value` into three all-digit segments: two of one or two digits
/// followed by a four-digit year.
fn split_numeric(value: &str, separator: char) -> Option<[&str; 3]> {
    let mut parts = value.split(separator);
    let first = parts.next()?;
    let second = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let short = |s: &str| (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !short(first) || !short(second) {
        return None;
    }
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some([first, second, year])
}

fn day_first(first: &str, second: &str, year: &str) -> Option<NaiveDate> {
    ymd(year, second, first)
}

fn month_first(first: &str, second: &str, year: &str) -> Option<NaiveDate> {
    ymd(year, first, second)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
