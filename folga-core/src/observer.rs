use chrono::NaiveDate;

use crate::eligibility::EligibilityWindow;
use crate::policy::{Policy, StaffLeaveHistory};
use crate::validator::ValidationResult;

/// Diagnostic hook for the calculator and the validator.
///
/// Observers only watch. Nothing they do can change a computed window or a
/// validation outcome.
pub trait WindowObserver {
    fn window_computed(&self, _policy: &Policy, _history: &StaffLeaveHistory, _window: &EligibilityWindow) {}

    fn validation_decided(&self, _policy: &Policy, _requested: NaiveDate, _result: &ValidationResult) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WindowObserver for NoopObserver {}

/// Sends every decision to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WindowObserver for TracingObserver {
    fn window_computed(&self, policy: &Policy, history: &StaffLeaveHistory, window: &EligibilityWindow) {
        tracing::debug!(
            staff_id = %history.staff_id,
            month = policy.month,
            year = policy.year,
            max_working_days = policy.max_consecutive_working_days,
            last_leave = ?history.last_leave_date,
            window_start = %window.window_start,
            window_end = %window.window_end,
            eligible_days = window.eligible_days_in_month.len(),
            "eligibility window computed"
        );
    }

    fn validation_decided(&self, policy: &Policy, requested: NaiveDate, result: &ValidationResult) {
        tracing::debug!(
            month = policy.month,
            year = policy.year,
            %requested,
            outcome = ?result.outcome,
            reason = ?result.reason_code,
            minimum_permitted = ?result.minimum_permitted_date,
            "leave date validated"
        );
    }
}
