// =====================
// Historical last leave
// =====================
//
// Staff joining a schedule without any leave on record get their last leave
// registered by hand. The registered date must be recent enough that the
// rest cycle still reaches into the schedule's month.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar_date::{format_iso_date, sub_days};
use crate::error::EligibilityError;
use crate::policy::Policy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastLeaveCheck {
    pub valid: bool,
    pub message: String,
    pub minimum_permitted_date: NaiveDate,
    pub schedule_first_day: NaiveDate,
    pub max_consecutive_working_days: u32,
}

/// `first day of the month - (max + 1)`.
pub fn minimum_last_leave_date(policy: &Policy) -> Result<NaiveDate, EligibilityError> {
    policy.check()?;
    let first_day = policy.first_day()?;
    sub_days(first_day, policy.rest_cycle_days())
        .ok_or_else(|| EligibilityError::policy(format!("{first_day} leaves no room for a rest cycle")))
}

/// The core never reads a clock; `today` comes from the caller.
pub fn ensure_not_in_future(last_leave: NaiveDate, today: NaiveDate) -> Result<(), EligibilityError> {
    if last_leave > today {
        return Err(EligibilityError::history(format!(
            "last leave {last_leave} is later than today ({today})"
        )));
    }
    Ok(())
}

pub fn check_last_leave(
    policy: &Policy,
    last_leave: NaiveDate,
    today: NaiveDate,
) -> Result<LastLeaveCheck, EligibilityError> {
    ensure_not_in_future(last_leave, today)?;

    let minimum = minimum_last_leave_date(policy)?;
    let first_day = policy.first_day()?;
    let valid = last_leave >= minimum;

    let message = if valid {
        "last leave date accepted".to_string()
    } else {
        format!(
            "last leave cannot be before {}: at most {} working days are allowed before {}",
            format_iso_date(minimum),
            policy.max_consecutive_working_days,
            format_iso_date(first_day),
        )
    };

    Ok(LastLeaveCheck {
        valid,
        message,
        minimum_permitted_date: minimum,
        schedule_first_day: first_day,
        max_consecutive_working_days: policy.max_consecutive_working_days,
    })
}

/// Staff without a last leave, or with one too old for this schedule,
/// need a history registered before their calendar is meaningful.
pub fn has_valid_history(policy: &Policy, last_leave: Option<NaiveDate>) -> bool {
    match (last_leave, minimum_last_leave_date(policy)) {
        (Some(last_leave), Ok(minimum)) => last_leave >= minimum,
        _ => false,
    }
}
