// =====================
// Domain models
// =====================

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use folga_core::{EligibilityError, Policy, StaffId, StaffLeaveHistory};
use serde::{Deserialize, Serialize};

pub type DepartmentId = i64;
pub type StaffMemberId = i64;
pub type ScheduleId = i64;
pub type LeaveId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "MORNING",
            Shift::Afternoon => "AFTERNOON",
            Shift::Night => "NIGHT",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MORNING" => Ok(Shift::Morning),
            "AFTERNOON" => Ok(Shift::Afternoon),
            "NIGHT" => Ok(Shift::Night),
            other => Err(format!("unknown shift '{other}', expected MORNING, AFTERNOON or NIGHT")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
}

/// Department (setor) that owns staff and schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: StaffMemberId,
    pub department_id: DepartmentId,
    pub name: String,
    pub shift: Shift,
    /// Registered historical last leave, set by hand for staff whose leaves
    /// predate the store.
    pub last_leave: Option<NaiveDate>,
}

impl StaffMember {
    pub fn staff_id(&self) -> StaffId {
        StaffId::from(self.id)
    }

    pub fn history(&self, last_leave: Option<NaiveDate>) -> StaffLeaveHistory {
        StaffLeaveHistory::new(self.staff_id(), last_leave)
    }
}

/// One department's shift for one month (escala).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub department_id: DepartmentId,
    pub shift: Shift,
    pub month: u32,
    pub year: i32,
    pub leaves_allowed: u32,
    pub max_consecutive_working_days: u32,
}

impl Schedule {
    pub fn policy(&self) -> Result<Policy, EligibilityError> {
        Policy::new(self.month, self.year, self.max_consecutive_working_days)
    }

    /// Staff belong to a schedule through their department and shift.
    pub fn covers(&self, staff: &StaffMember) -> bool {
        staff.department_id == self.department_id && staff.shift == self.shift
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    pub id: LeaveId,
    pub schedule_id: ScheduleId,
    pub staff_id: StaffMemberId,
    pub leave_date: NaiveDate,
    pub status: LeaveStatus,
    pub justification: Option<String>,
}

impl LeaveRecord {
    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub department_id: DepartmentId,
    pub shift: Shift,
    pub month: u32,
    pub year: i32,
    pub leaves_allowed: u32,
    pub max_consecutive_working_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeave {
    pub schedule_id: ScheduleId,
    pub staff_id: StaffMemberId,
    pub leave_date: NaiveDate,
    pub justification: Option<String>,
}

#[cfg(test)]
mod models_tests {
    use super::*;

    #[test]
    fn shift_parses_case_insensitively() {
        assert_eq!("night".parse::<Shift>(), Ok(Shift::Night));
        assert_eq!(" Morning ".parse::<Shift>(), Ok(Shift::Morning));
        assert!("evening".parse::<Shift>().is_err());
    }

    #[test]
    fn schedule_builds_its_policy() {
        let schedule = Schedule {
            id: 1,
            department_id: 1,
            shift: Shift::Morning,
            month: 11,
            year: 2024,
            leaves_allowed: 8,
            max_consecutive_working_days: 6,
        };
        assert_eq!(schedule.policy().unwrap(), Policy::new(11, 2024, 6).unwrap());

        let broken = Schedule { month: 13, ..schedule };
        assert!(matches!(broken.policy(), Err(EligibilityError::InvalidPolicy { .. })));
    }
}
