use chrono::{Datelike, NaiveDate};
use folga_core::calendar_date::{days_in_month, first_day_of_month};

/// Number of rows a month takes in a Monday-first calendar grid.
/// Month is 1-based; returns `None` for an invalid month.
pub fn weeks_in_month(year: i32, month: u32) -> Option<u32> {
    let first_day = first_day_of_month(year, month)?;
    let days = days_in_month(year, month)?;

    // blank cells before the 1st (Mon = 0, ..., Sun = 6)
    let start_offset = first_day.weekday().num_days_from_monday();

    Some((days + start_offset).div_ceil(7))
}

/// Row of `date` within its month's Monday-first grid, starting at 0.
pub fn week_row(date: NaiveDate) -> u32 {
    let start_offset = date.with_day(1).map_or(0, |d| d.weekday().num_days_from_monday());
    (date.day0() + start_offset) / 7
}

#[cfg(test)]
mod time_tests {
    use super::*;

    #[test]
    fn test_weeks_in_month() {
        // 2024-12-01 is a Sunday: 6 blanks + 31 days -> 6 rows
        assert_eq!(weeks_in_month(2024, 12), Some(6));
        // 2021-02-01 is a Monday and February has 28 days -> 4 rows
        assert_eq!(weeks_in_month(2021, 2), Some(4));
        // 2024-11-01 is a Friday: 4 + 30 -> 5 rows
        assert_eq!(weeks_in_month(2024, 11), Some(5));
        assert_eq!(weeks_in_month(2024, 0), None);
    }

    #[test]
    fn test_week_row() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 12, day).unwrap();
        assert_eq!(week_row(d(1)), 0);
        assert_eq!(week_row(d(2)), 1);
        assert_eq!(week_row(d(31)), 5);
    }
}
