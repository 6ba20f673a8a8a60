use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use chrono::{Datelike, NaiveDate, Weekday};
use folga_core::alerts::{generate_alerts, LeaveContext};
use folga_core::calendar_date::{days_in_month, iter_days};
use folga_core::eligibility::earliest_next_leave;
use folga_core::history::{check_last_leave, ensure_not_in_future, has_valid_history, minimum_last_leave_date};
use folga_core::month_rules::{average_leaves_per_day, sundays_in_month};
use folga_core::upcoming::{upcoming_leaves, UpcomingLeaves};
use folga_core::{compute_window, compute_window_observed, validate_observed, Policy, TracingObserver, ValidationResult};
use tracing::{info, instrument, warn};

use crate::application::dto::*;
use crate::application::time::{week_row, weeks_in_month};
use crate::domain::models::*;
use crate::error::StoreError;
use crate::infrastructure::leave_repo::{CheckedWrite, LeaveRepository, LeaveSnapshot};
use crate::infrastructure::schedule_repo::ScheduleRepository;

/// Leave use-cases on top of the repositories. Eligibility decisions are
/// delegated to `folga_core`; this layer only gathers inputs and persists.
pub struct LeaveService<'a> {
    schedules: &'a ScheduleRepository,
    leaves: &'a LeaveRepository,
    default_max_working_days: u32,
}

impl<'a> LeaveService<'a> {
    pub fn new(schedules: &'a ScheduleRepository, leaves: &'a LeaveRepository, default_max_working_days: u32) -> Self {
        Self { schedules, leaves, default_max_working_days }
    }

    // =====================
    // Lookups
    // =====================

    async fn schedule(&self, id: ScheduleId) -> Result<Schedule, StoreError> {
        self.schedules
            .find_schedule(id)
            .await?
            .ok_or_else(|| StoreError::not_found("schedule", id))
    }

    async fn staff(&self, id: StaffMemberId) -> Result<StaffMember, StoreError> {
        self.schedules
            .find_staff(id)
            .await?
            .ok_or_else(|| StoreError::not_found("staff member", id))
    }

    async fn schedule_and_staff(
        &self,
        schedule_id: ScheduleId,
        staff_id: StaffMemberId,
    ) -> Result<(Schedule, StaffMember), StoreError> {
        let schedule = self.schedule(schedule_id).await?;
        let staff = self.staff(staff_id).await?;

        if !schedule.covers(&staff) {
            return Err(StoreError::business(format!(
                "{} ({}) is not part of schedule {}",
                staff.name, staff.shift, schedule.id
            )));
        }
        Ok((schedule, staff))
    }

    // =====================
    // Calendar
    // =====================

    /// Eligible, occupied and own-leave flags for every day of the schedule.
    ///
    /// `window` opens after the staff member's latest leave in the month. A
    /// day's `eligible` flag also looks at the leaves on both sides of it,
    /// the same way a request for that day is checked.
    #[instrument(skip(self))]
    pub async fn calendar(&self, schedule_id: ScheduleId, staff_id: StaffMemberId) -> Result<CalendarView, StoreError> {
        let (schedule, staff) = self.schedule_and_staff(schedule_id, staff_id).await?;
        let policy = schedule.policy()?;
        let first_day = policy.first_day()?;
        let last_day = policy.last_day()?;

        let timeline = self.leaves.leave_timeline(staff.id).await?;
        let records = self.leaves.list_for_schedule(schedule.id).await?;
        let staff_in_shift = self.schedules.count_staff_in_shift(schedule.department_id, schedule.shift).await?;
        let load = MonthLoad::new(&schedule, staff_in_shift, &records);

        // latest leave up to the end of the month
        let last_leave = timeline.range(..=last_day).next_back().copied();
        let window = compute_window_observed(&policy, &staff.history(last_leave), &TracingObserver)?;

        let (own, occupied): (Vec<&LeaveRecord>, Vec<&LeaveRecord>) =
            records.iter().partition(|r| r.staff_id == staff.id);

        let days = iter_days(first_day, last_day)
            .map(|date| -> Result<CalendarDay, StoreError> {
                let own_leave = own.iter().any(|r| r.leave_date == date);
                Ok(CalendarDay {
                    date,
                    day: date.day(),
                    week: week_row(date),
                    weekday: date.weekday().num_days_from_monday(),
                    eligible: !own_leave && fits_between(&policy, &staff, &timeline, date)?,
                    occupied: occupied.iter().any(|r| r.leave_date == date),
                    own_leave,
                    leaves_on_day: load.on(date),
                    daily_quota: load.quota(date),
                    status: load.status(date),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(CalendarView {
            schedule_id: schedule.id,
            staff_id: staff.id,
            staff_name: staff.name,
            month: schedule.month,
            year: schedule.year,
            weeks_in_month: weeks_in_month(schedule.year, schedule.month).unwrap_or(0),
            last_leave,
            has_valid_history: has_valid_history(&policy, last_leave),
            window,
            days,
        })
    }

    /// Whole-schedule picture: every staff member's standing, the month's
    /// allocation summary and the staff who still need a last leave.
    #[instrument(skip(self))]
    pub async fn overview(&self, schedule_id: ScheduleId) -> Result<ScheduleOverview, StoreError> {
        let schedule = self.schedule(schedule_id).await?;
        let policy = schedule.policy()?;
        let first_day = policy.first_day()?;
        let last_day = policy.last_day()?;

        let department = self
            .schedules
            .find_department(schedule.department_id)
            .await?
            .ok_or_else(|| StoreError::not_found("department", schedule.department_id))?;
        let members = self.schedules.list_staff(schedule.department_id, schedule.shift).await?;
        let records = self.leaves.list_for_schedule(schedule.id).await?;
        let total_staff = u32::try_from(members.len()).unwrap_or(u32::MAX);
        let load = MonthLoad::new(&schedule, total_staff, &records);

        let mut staff = Vec::with_capacity(members.len());
        for member in &members {
            let timeline = self.leaves.leave_timeline(member.id).await?;
            let last_leave = timeline.range(..=last_day).next_back().copied();
            let next_available = last_leave.map(|d| earliest_next_leave(d, &policy)).transpose()?;

            let taken: Vec<NaiveDate> = records
                .iter()
                .filter(|r| r.staff_id == member.id)
                .map(|r| r.leave_date)
                .collect();
            let leaves_taken = u32::try_from(taken.len()).unwrap_or(u32::MAX);

            staff.push(StaffStanding {
                staff_id: member.id,
                name: member.name.clone(),
                last_leave,
                has_valid_history: has_valid_history(&policy, last_leave),
                next_available,
                leaves_taken,
                leaves_remaining: schedule.leaves_allowed.saturating_sub(leaves_taken),
                has_sunday_leave: taken.iter().any(|d| d.weekday() == Weekday::Sun),
            });
        }

        let leaves_taken = u32::try_from(records.len()).unwrap_or(u32::MAX);
        let leaves_available = total_staff.saturating_mul(schedule.leaves_allowed);
        let mut summary = ScheduleSummary {
            total_staff,
            leaves_taken,
            leaves_remaining: leaves_available.saturating_sub(leaves_taken),
            percent_allocated: if leaves_available > 0 {
                leaves_taken.saturating_mul(100) / leaves_available
            } else {
                0
            },
            open_days: 0,
            near_limit_days: 0,
            full_days: 0,
        };
        for date in iter_days(first_day, last_day) {
            match load.status(date) {
                DayStatus::Open => summary.open_days += 1,
                DayStatus::NearLimit => summary.near_limit_days += 1,
                DayStatus::Full => summary.full_days += 1,
            }
        }

        let staff_without_history: Vec<StaffMemberId> =
            staff.iter().filter(|s| !s.has_valid_history).map(|s| s.staff_id).collect();
        let history_warning = if staff_without_history.is_empty() {
            None
        } else {
            warn!(schedule_id, missing = staff_without_history.len(), "staff without a usable last leave");
            Some(format!(
                "{} staff member(s) have no last leave on or after {}; register one so their leaves are spaced correctly",
                staff_without_history.len(),
                minimum_last_leave_date(&policy)?,
            ))
        };

        Ok(ScheduleOverview {
            schedule_id: schedule.id,
            department_name: department.name,
            shift: schedule.shift,
            month: schedule.month,
            year: schedule.year,
            staff,
            summary,
            staff_without_history,
            history_warning,
        })
    }

    // =====================
    // Request / move / remove
    // =====================

    #[instrument(skip(self, justification))]
    pub async fn request_leave(
        &self,
        schedule_id: ScheduleId,
        staff_id: StaffMemberId,
        date: NaiveDate,
        justification: Option<String>,
    ) -> Result<LeaveOutcome, StoreError> {
        let (schedule, staff) = self.schedule_and_staff(schedule_id, staff_id).await?;
        let policy = schedule.policy()?;

        let new = NewLeave { schedule_id, staff_id, leave_date: date, justification };
        let write = self
            .leaves
            .insert_checked(&new, |snapshot| {
                if snapshot.leaves_taken >= schedule.leaves_allowed {
                    return Err(StoreError::business(format!(
                        "{} already has {} of {} leaves in this schedule",
                        staff.name, snapshot.leaves_taken, schedule.leaves_allowed
                    )));
                }
                decide(&policy, &staff, snapshot, date)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "leave request refused"))?;

        self.outcome(&schedule, &staff, write, "leave recorded").await
    }

    /// Moves a pending leave. The new date is validated as if the old one
    /// had never been taken.
    #[instrument(skip(self))]
    pub async fn update_leave(&self, leave_id: LeaveId, new_date: NaiveDate) -> Result<LeaveOutcome, StoreError> {
        let current = self
            .leaves
            .find(leave_id)
            .await?
            .ok_or_else(|| StoreError::not_found("leave", leave_id))?;
        let (schedule, staff) = self.schedule_and_staff(current.schedule_id, current.staff_id).await?;
        let policy = schedule.policy()?;

        let write = self
            .leaves
            .update_checked(leave_id, new_date, |_, snapshot| decide(&policy, &staff, snapshot, new_date))
            .await
            .inspect_err(|e| warn!(error = %e, "leave update refused"))?;

        self.outcome(&schedule, &staff, write, "leave moved").await
    }

    #[instrument(skip(self))]
    pub async fn delete_leave(&self, leave_id: LeaveId) -> Result<LeaveRecord, StoreError> {
        self.leaves.delete_pending(leave_id).await
    }

    pub async fn approve_leave(&self, leave_id: LeaveId) -> Result<LeaveRecord, StoreError> {
        self.leaves.approve(leave_id).await
    }

    async fn outcome(
        &self,
        schedule: &Schedule,
        staff: &StaffMember,
        write: CheckedWrite,
        action: &str,
    ) -> Result<LeaveOutcome, StoreError> {
        let CheckedWrite { record, snapshot, validation } = write;

        let context = LeaveContext {
            staff_name: staff.name.clone(),
            leave_date: record.leave_date,
            previous_leave: snapshot.last_leave,
            month: schedule.month,
            year: schedule.year,
            leaves_allowed: schedule.leaves_allowed,
            leaves_taken: self.leaves.count_for_staff(schedule.id, staff.id).await?,
            has_sunday_leave: self.leaves.has_sunday_leave(schedule.id, staff.id).await?,
            on_leave_same_day: self.leaves.count_on_date(schedule.id, record.leave_date).await?,
            staff_in_shift: self.schedules.count_staff_in_shift(schedule.department_id, schedule.shift).await?,
        };
        let alerts = generate_alerts(&context);
        if !alerts.is_empty() {
            info!(leave_id = record.id, alerts = alerts.len(), "leave accepted with alerts");
        }

        Ok(LeaveOutcome {
            message: format!("{action} for {} on {}", staff.name, record.leave_date),
            leave: record,
            validation,
            alerts,
        })
    }

    // =====================
    // History
    // =====================

    /// Registers the last leave of someone joining without records. With a
    /// schedule, the date must still reach into that schedule's month.
    #[instrument(skip(self))]
    pub async fn register_last_leave(
        &self,
        staff_id: StaffMemberId,
        date: NaiveDate,
        schedule_id: Option<ScheduleId>,
        today: NaiveDate,
    ) -> Result<LastLeaveRegistration, StoreError> {
        let staff = self.staff(staff_id).await?;
        ensure_not_in_future(date, today)?;

        let check = match schedule_id {
            Some(id) => {
                let (schedule, _) = self.schedule_and_staff(id, staff.id).await?;
                let check = check_last_leave(&schedule.policy()?, date, today)?;
                if !check.valid {
                    return Err(StoreError::business(check.message));
                }
                Some(check)
            }
            None => None,
        };

        self.schedules.set_last_leave(staff.id, date).await?;

        Ok(LastLeaveRegistration { staff_id: staff.id, last_leave: date, check })
    }

    /// Next dates open to the staff member after their latest leave.
    pub async fn upcoming(&self, staff_id: StaffMemberId, today: NaiveDate) -> Result<UpcomingLeaves, StoreError> {
        let staff = self.staff(staff_id).await?;
        let latest = self
            .leaves
            .latest_leave(staff.id)
            .await?
            .ok_or_else(|| StoreError::business(format!("{} has no leave on record", staff.name)))?;

        // the limit of the schedule the latest leave belongs to, if any
        let max_working_days = self
            .schedules
            .find_schedule_for(&staff, latest.month(), latest.year())
            .await?
            .map_or(self.default_max_working_days, |s| s.max_consecutive_working_days);

        let policy = Policy::new(latest.month(), latest.year(), max_working_days)?;
        Ok(upcoming_leaves(latest, &policy, today)?)
    }
}

fn decide(
    policy: &Policy,
    staff: &StaffMember,
    snapshot: &LeaveSnapshot,
    date: NaiveDate,
) -> Result<ValidationResult, StoreError> {
    if snapshot.own_dates.contains(&date) {
        return Err(StoreError::business(format!("{} already has a leave on {date}", staff.name)));
    }
    let history = staff.history(snapshot.last_leave);
    let validation = validate_observed(policy, &history, date, &snapshot.occupied, &TracingObserver)?;

    if let Some(next) = snapshot.next_leave {
        if validation.is_valid() && !clears_next_leave(policy, date, Some(next))? {
            return Err(StoreError::business(format!(
                "{} already has a leave on {next}; a leave on {date} must be at least {} days before it",
                staff.name,
                policy.rest_cycle_days()
            )));
        }
    }
    Ok(validation)
}

/// The following leave must still open a full rest cycle after `date`.
fn clears_next_leave(policy: &Policy, date: NaiveDate, next: Option<NaiveDate>) -> Result<bool, StoreError> {
    match next {
        Some(next) => Ok(earliest_next_leave(date, policy)? <= next),
        None => Ok(true),
    }
}

/// Day rule shared with the checked writes: in the window opened by the
/// previous leave, and far enough before the next one.
fn fits_between(
    policy: &Policy,
    staff: &StaffMember,
    timeline: &BTreeSet<NaiveDate>,
    date: NaiveDate,
) -> Result<bool, StoreError> {
    let previous = timeline.range(..date).next_back().copied();
    let next = timeline.range((Bound::Excluded(date), Bound::Unbounded)).next().copied();

    let window = compute_window(policy, &staff.history(previous))?;
    Ok(window.contains(date) && clears_next_leave(policy, date, next)?)
}

/// Leaves per day against the month's per-day quota.
struct MonthLoad {
    per_day: BTreeMap<NaiveDate, u32>,
    days_in_month: u32,
    sundays: u32,
    staff_in_shift: u32,
    leaves_allowed: u32,
}

impl MonthLoad {
    fn new(schedule: &Schedule, staff_in_shift: u32, records: &[LeaveRecord]) -> Self {
        let mut per_day = BTreeMap::new();
        for record in records {
            *per_day.entry(record.leave_date).or_insert(0u32) += 1;
        }
        Self {
            per_day,
            days_in_month: days_in_month(schedule.year, schedule.month).unwrap_or(0),
            sundays: sundays_in_month(schedule.year, schedule.month),
            staff_in_shift,
            leaves_allowed: schedule.leaves_allowed,
        }
    }

    fn on(&self, date: NaiveDate) -> u32 {
        self.per_day.get(&date).copied().unwrap_or(0)
    }

    fn quota(&self, date: NaiveDate) -> u32 {
        average_leaves_per_day(self.days_in_month, self.staff_in_shift, self.sundays, date.weekday(), self.leaves_allowed)
    }

    fn status(&self, date: NaiveDate) -> DayStatus {
        DayStatus::from_load(self.on(date), self.quota(date))
    }
}
