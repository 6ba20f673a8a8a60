use chrono::NaiveDate;
use folga_core::alerts::Alert;
use folga_core::history::LastLeaveCheck;
use folga_core::{EligibilityWindow, ValidationResult};
use serde::Serialize;

use crate::domain::models::{LeaveRecord, ScheduleId, Shift, StaffMemberId};

/// One cell of the monthly calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    /// Row in a Monday-first month grid, starting at 0
    pub week: u32,
    /// 0 (Mon) ~ 6 (Sun)
    pub weekday: u32,
    pub eligible: bool,
    /// Taken by someone else in the schedule
    pub occupied: bool,
    pub own_leave: bool,
    /// Leaves of the whole schedule on this day
    pub leaves_on_day: u32,
    pub daily_quota: u32,
    pub status: DayStatus,
}

/// How full a day is against its quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Open,
    /// At 70% of the quota or more
    NearLimit,
    Full,
}

impl DayStatus {
    pub fn from_load(leaves_on_day: u32, daily_quota: u32) -> Self {
        if leaves_on_day >= daily_quota {
            DayStatus::Full
        } else if u64::from(leaves_on_day) * 10 >= u64::from(daily_quota) * 7 {
            DayStatus::NearLimit
        } else {
            DayStatus::Open
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub schedule_id: ScheduleId,
    pub staff_id: StaffMemberId,
    pub staff_name: String,
    pub month: u32,
    pub year: i32,
    pub weeks_in_month: u32,
    pub last_leave: Option<NaiveDate>,
    /// False when no last leave is known or it is too old for this month.
    pub has_valid_history: bool,
    pub window: EligibilityWindow,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffStanding {
    pub staff_id: StaffMemberId,
    pub name: String,
    pub last_leave: Option<NaiveDate>,
    pub has_valid_history: bool,
    /// First day after the rest cycle of `last_leave`; absent without history.
    pub next_available: Option<NaiveDate>,
    pub leaves_taken: u32,
    pub leaves_remaining: u32,
    pub has_sunday_leave: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_staff: u32,
    pub leaves_taken: u32,
    pub leaves_remaining: u32,
    /// Rounded down
    pub percent_allocated: u32,
    pub open_days: u32,
    pub near_limit_days: u32,
    pub full_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOverview {
    pub schedule_id: ScheduleId,
    pub department_name: String,
    pub shift: Shift,
    pub month: u32,
    pub year: i32,
    pub staff: Vec<StaffStanding>,
    pub summary: ScheduleSummary,
    pub staff_without_history: Vec<StaffMemberId>,
    pub history_warning: Option<String>,
}

/// Returned after a leave has been written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveOutcome {
    pub leave: LeaveRecord,
    pub validation: ValidationResult,
    pub message: String,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastLeaveRegistration {
    pub staff_id: StaffMemberId,
    pub last_leave: NaiveDate,
    /// Present when a schedule was given to check the date against.
    pub check: Option<LastLeaveCheck>,
}
