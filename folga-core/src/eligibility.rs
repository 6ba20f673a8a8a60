// =====================
// Eligibility window
// =====================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar_date::{add_days, iter_days};
use crate::error::EligibilityError;
use crate::observer::{NoopObserver, WindowObserver};
use crate::policy::{Policy, StaffId, StaffLeaveHistory};

/// Days on which a staff member may take their next leave, seen through one
/// target month.
///
/// Without history the window is the whole month. With history it opens on
/// `last_leave + 1 + max_consecutive_working_days` and conceptually never
/// closes; `window_end` is the last day of the target month. When the
/// opening day is past that month the window is empty and
/// `window_start > window_end`.
///
/// ```text
///  last leave          earliest next leave
///  v                   v
/// [L] W  W  W  W  W  W [E  E  E ...
///      <-- max = 6 -->
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityWindow {
    pub staff_id: StaffId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Ascending, no duplicates, only days of the target month.
    pub eligible_days_in_month: Vec<u32>,
}

impl EligibilityWindow {
    pub fn is_empty(&self) -> bool {
        self.window_start > self.window_end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.window_start <= date && date <= self.window_end
    }

    pub fn is_day_eligible(&self, day: u32) -> bool {
        self.eligible_days_in_month.binary_search(&day).is_ok()
    }

    /// First day a new leave is allowed. May lie before or after the target
    /// month.
    pub fn earliest_next_leave(&self) -> NaiveDate {
        self.window_start
    }
}

/// First permitted leave day after `last_leave`.
pub fn earliest_next_leave(last_leave: NaiveDate, policy: &Policy) -> Result<NaiveDate, EligibilityError> {
    add_days(last_leave, policy.rest_cycle_days()).ok_or_else(|| {
        EligibilityError::history(format!("{last_leave} is too far in the future to schedule after"))
    })
}

pub fn compute_window(policy: &Policy, history: &StaffLeaveHistory) -> Result<EligibilityWindow, EligibilityError> {
    compute_window_observed(policy, history, &NoopObserver)
}

pub fn compute_window_observed(
    policy: &Policy,
    history: &StaffLeaveHistory,
    observer: &dyn WindowObserver,
) -> Result<EligibilityWindow, EligibilityError> {
    policy.check()?;

    let month_first = policy.first_day()?;
    let month_last = policy.last_day()?;

    // 1. no history -> whole month
    // 2. history -> last leave + 1 + max, open-ended
    let window_start = match history.last_leave_date {
        None => month_first,
        Some(last_leave) => earliest_next_leave(last_leave, policy)?,
    };
    let window_end = month_last;

    // 3. keep only the target month's days
    let eligible_days_in_month = iter_days(window_start.max(month_first), window_end.min(month_last))
        .filter(|d| d.year() == policy.year && d.month() == policy.month)
        .map(|d| d.day())
        .collect();

    let window = EligibilityWindow {
        staff_id: history.staff_id.clone(),
        window_start,
        window_end,
        eligible_days_in_month,
    };

    observer.window_computed(policy, history, &window);
    Ok(window)
}
