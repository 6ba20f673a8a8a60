use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar_date::{first_day_of_month, last_day_of_month, parse_iso_date};
use crate::error::EligibilityError;

/// Used by the schedule configuration when nothing else is set.
pub const DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS: u32 = 6;

pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 9999;

/// Opaque staff identifier, as handed out by the leave-record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for StaffId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StaffId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StaffId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Leave policy of one monthly schedule (escala).
///
/// Owned by the schedule record and passed by value into every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub month: u32,
    pub year: i32,
    pub max_consecutive_working_days: u32,
}

impl Policy {
    pub fn new(month: u32, year: i32, max_consecutive_working_days: u32) -> Result<Self, EligibilityError> {
        let policy = Self { month, year, max_consecutive_working_days };
        policy.check()?;
        Ok(policy)
    }

    pub fn with_default_limit(month: u32, year: i32) -> Result<Self, EligibilityError> {
        Self::new(month, year, DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS)
    }

    /// Re-validates a policy that did not come through [`Policy::new`]
    /// (deserialized, built literally, ...).
    pub fn check(&self) -> Result<(), EligibilityError> {
        if !(1..=12).contains(&self.month) {
            return Err(EligibilityError::policy(format!(
                "month must be within 1..=12, got {}",
                self.month
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(EligibilityError::policy(format!(
                "year must be a 4-digit year, got {}",
                self.year
            )));
        }
        if self.max_consecutive_working_days < 1 {
            return Err(EligibilityError::policy(
                "maxConsecutiveWorkingDays must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn first_day(&self) -> Result<NaiveDate, EligibilityError> {
        first_day_of_month(self.year, self.month)
            .ok_or_else(|| EligibilityError::policy(format!("{}/{} has no first day", self.month, self.year)))
    }

    pub fn last_day(&self) -> Result<NaiveDate, EligibilityError> {
        last_day_of_month(self.year, self.month)
            .ok_or_else(|| EligibilityError::policy(format!("{}/{} has no last day", self.month, self.year)))
    }

    /// Mandatory rest day plus the working days allowed before the next one.
    pub fn rest_cycle_days(&self) -> u64 {
        1 + u64::from(self.max_consecutive_working_days)
    }
}

/// What the store knows about a staff member's previous leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLeaveHistory {
    pub staff_id: StaffId,
    pub last_leave_date: Option<NaiveDate>,
}

impl StaffLeaveHistory {
    pub fn new(staff_id: impl Into<StaffId>, last_leave_date: Option<NaiveDate>) -> Self {
        Self { staff_id: staff_id.into(), last_leave_date }
    }

    pub fn without_leave(staff_id: impl Into<StaffId>) -> Self {
        Self::new(staff_id, None)
    }

    /// Builds a history from the ISO string stored at the boundary.
    /// A malformed string is an error, never "no history".
    pub fn from_iso(staff_id: impl Into<StaffId>, last_leave_date: Option<&str>) -> Result<Self, EligibilityError> {
        let parsed = last_leave_date
            .map(|raw| parse_iso_date(raw).map_err(|e| EligibilityError::history(e.to_string())))
            .transpose()?;
        Ok(Self::new(staff_id, parsed))
    }
}
