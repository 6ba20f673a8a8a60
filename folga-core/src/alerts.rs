// =====================
// Advisory alerts
// =====================
//
// Alerts are produced after a leave has been accepted. They never block it.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar_date::{add_days, first_day_of_month, iter_days, last_day_of_month};

pub const RECOMMENDED_INTERVAL_DAYS: i64 = 5;
pub const MIN_SHIFT_COVERAGE: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ShortInterval,
    MissingSunday,
    ShiftImbalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub recommendation: String,
}

/// Snapshot of the schedule around one accepted leave. Counts include the
/// leave itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveContext {
    pub staff_name: String,
    pub leave_date: NaiveDate,
    pub previous_leave: Option<NaiveDate>,
    pub month: u32,
    pub year: i32,
    pub leaves_allowed: u32,
    pub leaves_taken: u32,
    pub has_sunday_leave: bool,
    pub on_leave_same_day: u32,
    pub staff_in_shift: u32,
}

pub fn generate_alerts(ctx: &LeaveContext) -> Vec<Alert> {
    [short_interval(ctx), missing_sunday(ctx), shift_imbalance(ctx)]
        .into_iter()
        .flatten()
        .collect()
}

pub fn short_interval(ctx: &LeaveContext) -> Option<Alert> {
    let previous = ctx.previous_leave?;
    let days_between = (ctx.leave_date - previous).num_days();

    if days_between <= 0 || days_between >= RECOMMENDED_INTERVAL_DAYS {
        return None;
    }

    let suggested = add_days(ctx.leave_date, (RECOMMENDED_INTERVAL_DAYS - days_between) as u64)?;
    Some(Alert {
        kind: AlertKind::ShortInterval,
        message: format!(
            "short interval between leaves: {days_between} days (recommended: {RECOMMENDED_INTERVAL_DAYS}+). \
             previous leave: {previous}, new leave: {}",
            ctx.leave_date
        ),
        recommendation: format!("consider moving the leave to {suggested} or later"),
    })
}

pub fn missing_sunday(ctx: &LeaveContext) -> Option<Alert> {
    if ctx.has_sunday_leave || ctx.leaves_taken >= ctx.leaves_allowed {
        return None;
    }

    let sundays = sundays_of_month(ctx.year, ctx.month)
        .iter()
        .map(|d| d.format("%d/%m").to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Some(Alert {
        kind: AlertKind::MissingSunday,
        message: format!(
            "{} has no Sunday leave in {:02}/{} yet. leaves left: {}. Sundays: {sundays}",
            ctx.staff_name,
            ctx.month,
            ctx.year,
            ctx.leaves_allowed - ctx.leaves_taken,
        ),
        recommendation: format!("schedule one of the next leaves on a Sunday: {sundays}"),
    })
}

pub fn shift_imbalance(ctx: &LeaveContext) -> Option<Alert> {
    if ctx.staff_in_shift == 0 {
        return None;
    }

    let on_leave_ratio = f64::from(ctx.on_leave_same_day) / f64::from(ctx.staff_in_shift);
    let coverage = 1.0 - on_leave_ratio;
    if coverage >= MIN_SHIFT_COVERAGE {
        return None;
    }

    let max_simultaneous = (f64::from(ctx.staff_in_shift) * (1.0 - MIN_SHIFT_COVERAGE)).floor() as u32;
    Some(Alert {
        kind: AlertKind::ShiftImbalance,
        message: format!(
            "coverage imbalance on {}: {} of {} staff on leave, shift coverage {:.0}% (minimum {:.0}%)",
            ctx.leave_date,
            ctx.on_leave_same_day,
            ctx.staff_in_shift,
            coverage * 100.0,
            MIN_SHIFT_COVERAGE * 100.0,
        ),
        recommendation: format!("redistribute leaves; at most {max_simultaneous} simultaneous leaves on this day"),
    })
}

pub fn sundays_of_month(year: i32, month: u32) -> Vec<NaiveDate> {
    match (first_day_of_month(year, month), last_day_of_month(year, month)) {
        (Some(first), Some(last)) => iter_days(first, last).filter(|d| d.weekday() == Weekday::Sun).collect(),
        _ => Vec::new(),
    }
}
