use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar_date::add_days;
use crate::eligibility::earliest_next_leave;
use crate::error::EligibilityError;
use crate::policy::Policy;

pub const UPCOMING_SUGGESTIONS: usize = 5;

/// Suggestions shown right after a leave has been granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingLeaves {
    pub next_available: NaiveDate,
    pub next_dates: Vec<NaiveDate>,
    pub days_until_next: u32,
}

/// The next leave opens with the same rest cycle the calculator uses, so the
/// first suggestion is always the window start for `leave_date`.
pub fn upcoming_leaves(
    leave_date: NaiveDate,
    policy: &Policy,
    today: NaiveDate,
) -> Result<UpcomingLeaves, EligibilityError> {
    let next_available = earliest_next_leave(leave_date, policy)?;

    let next_dates = (0..UPCOMING_SUGGESTIONS as u64)
        .map_while(|offset| add_days(next_available, offset))
        .collect();

    let days_until_next = (next_available - today).num_days().max(0);

    Ok(UpcomingLeaves {
        next_available,
        next_dates,
        days_until_next: u32::try_from(days_until_next).unwrap_or(u32::MAX),
    })
}
