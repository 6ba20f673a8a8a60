use chrono::{Datelike, Weekday};

use crate::calendar_date::{first_day_of_month, iter_days, last_day_of_month};

pub fn count_weekday_in_month(year: i32, month: u32, weekday: Weekday) -> u32 {
    match (first_day_of_month(year, month), last_day_of_month(year, month)) {
        (Some(first), Some(last)) => iter_days(first, last).filter(|d| d.weekday() == weekday).count() as u32,
        _ => 0,
    }
}

pub fn sundays_in_month(year: i32, month: u32) -> u32 {
    count_weekday_in_month(year, month, Weekday::Sun)
}

/// How many staff may be on leave on a given kind of day.
///
/// Sundays are filled first, one share of the staff per Sunday; the leaves
/// left over are spread across the remaining days. Both quotas round up.
pub fn average_leaves_per_day(
    total_days_in_month: u32,
    total_staff: u32,
    sundays_in_month: u32,
    weekday: Weekday,
    leaves_per_staff: u32,
) -> u32 {
    if total_days_in_month == 0 || total_staff == 0 || leaves_per_staff == 0 {
        return 0;
    }

    let total_leaves = total_staff.saturating_mul(leaves_per_staff);

    let per_sunday = if sundays_in_month > 0 { total_staff.div_ceil(sundays_in_month) } else { 0 };
    let remaining = total_leaves.saturating_sub(per_sunday.saturating_mul(sundays_in_month));

    let other_days = total_days_in_month.saturating_sub(sundays_in_month);
    let per_other_day = if other_days > 0 { remaining.div_ceil(other_days) } else { 0 };

    if weekday == Weekday::Sun {
        per_sunday
    } else {
        per_other_day
    }
}
