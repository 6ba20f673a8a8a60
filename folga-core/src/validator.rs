use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar_date::{format_iso_date, is_in_month, parse_iso_date};
use crate::eligibility::compute_window_observed;
use crate::error::EligibilityError;
use crate::observer::{NoopObserver, WindowObserver};
use crate::policy::{Policy, StaffLeaveHistory};

/// Days already assigned to other staff in the same schedule.
///
/// The set is a snapshot taken by the caller for one call.
pub trait DayOccupancy {
    fn is_occupied(&self, date: NaiveDate) -> bool;
}

impl DayOccupancy for HashSet<NaiveDate> {
    fn is_occupied(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl DayOccupancy for BTreeSet<NaiveDate> {
    fn is_occupied(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl DayOccupancy for [NaiveDate] {
    fn is_occupied(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl DayOccupancy for Vec<NaiveDate> {
    fn is_occupied(&self, date: NaiveDate) -> bool {
        self.as_slice().is_occupied(date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    None,
    BeforeWindow,
    AfterWindow,
    DateOccupied,
    OutsideTargetMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub outcome: Outcome,
    pub reason_code: ReasonCode,
    pub minimum_permitted_date: Option<NaiveDate>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { outcome: Outcome::Valid, reason_code: ReasonCode::None, minimum_permitted_date: None }
    }

    pub fn invalid(reason_code: ReasonCode, minimum_permitted_date: Option<NaiveDate>) -> Self {
        Self { outcome: Outcome::Invalid, reason_code, minimum_permitted_date }
    }

    pub fn is_valid(&self) -> bool {
        self.outcome == Outcome::Valid
    }

    /// A sentence the caller can show as-is.
    pub fn message(&self) -> String {
        let earliest = self
            .minimum_permitted_date
            .map(|d| format!(" earliest eligible date is {}", format_iso_date(d)))
            .unwrap_or_default();

        match self.reason_code {
            ReasonCode::None => "leave date accepted".to_string(),
            ReasonCode::BeforeWindow => format!("leave date is before the eligibility window;{earliest}"),
            ReasonCode::AfterWindow => format!("leave date is after the eligibility window;{earliest}"),
            ReasonCode::DateOccupied => "leave date is already assigned to another staff member".to_string(),
            ReasonCode::OutsideTargetMonth => "leave date is outside the schedule's month".to_string(),
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub fn validate<O>(
    policy: &Policy,
    history: &StaffLeaveHistory,
    requested: NaiveDate,
    occupied: &O,
) -> Result<ValidationResult, EligibilityError>
where
    O: DayOccupancy + ?Sized,
{
    validate_observed(policy, history, requested, occupied, &NoopObserver)
}

/// Same as [`validate`] for a date still in its `YYYY-MM-DD` boundary form.
pub fn validate_iso<O>(
    policy: &Policy,
    history: &StaffLeaveHistory,
    requested: &str,
    occupied: &O,
) -> Result<ValidationResult, EligibilityError>
where
    O: DayOccupancy + ?Sized,
{
    let requested_date = parse_iso_date(requested).map_err(|e| EligibilityError::InvalidDate {
        input: requested.to_string(),
        reason: e.to_string(),
    })?;
    validate(policy, history, requested_date, occupied)
}

/// Decision order: target month, window end (or an empty window), window
/// start, window days, occupancy.
///
/// An occupied day outside the window is reported as a window violation.
pub fn validate_observed<O>(
    policy: &Policy,
    history: &StaffLeaveHistory,
    requested: NaiveDate,
    occupied: &O,
    observer: &dyn WindowObserver,
) -> Result<ValidationResult, EligibilityError>
where
    O: DayOccupancy + ?Sized,
{
    policy.check()?;

    let result = decide(policy, history, requested, occupied, observer)?;
    observer.validation_decided(policy, requested, &result);
    Ok(result)
}

fn decide<O>(
    policy: &Policy,
    history: &StaffLeaveHistory,
    requested: NaiveDate,
    occupied: &O,
    observer: &dyn WindowObserver,
) -> Result<ValidationResult, EligibilityError>
where
    O: DayOccupancy + ?Sized,
{
    if !is_in_month(requested, policy.year, policy.month) {
        return Ok(ValidationResult::invalid(ReasonCode::OutsideTargetMonth, None));
    }

    let window = compute_window_observed(policy, history, observer)?;
    let earliest = Some(window.window_start);

    // an empty window opens in a later month, so every in-month day is past its end
    if window.is_empty() || requested > window.window_end {
        return Ok(ValidationResult::invalid(ReasonCode::AfterWindow, earliest));
    }
    if requested < window.window_start {
        return Ok(ValidationResult::invalid(ReasonCode::BeforeWindow, earliest));
    }

    if !window.is_day_eligible(requested.day()) {
        // unreachable with a well-formed window; report the nearer bound
        let to_start = (requested - window.window_start).num_days().abs();
        let to_end = (window.window_end - requested).num_days().abs();
        let reason = if to_start <= to_end { ReasonCode::BeforeWindow } else { ReasonCode::AfterWindow };
        return Ok(ValidationResult::invalid(reason, earliest));
    }

    if occupied.is_occupied(requested) {
        return Ok(ValidationResult::invalid(ReasonCode::DateOccupied, None));
    }

    Ok(ValidationResult::valid())
}
