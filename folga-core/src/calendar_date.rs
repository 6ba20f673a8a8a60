// =====================
// Calendar date utilities
// =====================
//
// All dates are plain (year, month, day) triples. Nothing here ever looks at a
// clock or a time zone.

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{input}' is not a YYYY-MM-DD calendar date")]
pub struct DateParseError {
    pub input: String,
}

/// Strict `YYYY-MM-DD` parsing.
///
/// chrono alone accepts `2024-1-5`; the boundary format is zero padded, so the
/// shape is checked before handing the string over.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let bytes = input.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_shaped {
        return Err(DateParseError { input: input.to_string() });
    }

    NaiveDate::parse_from_str(input, ISO_DATE_FORMAT)
        .map_err(|_| DateParseError { input: input.to_string() })
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// The day before the first of the next month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    last_day_of_month(year, month).map(|d| d.day())
}

pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

pub fn sub_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(days))
}

pub fn is_in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// Walks `start..=end` one day at a time. Empty when `start > end`.
pub fn iter_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.succ_opt()).take_while(move |d| *d <= end)
}
