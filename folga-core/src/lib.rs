//! Leave-day ("folga") eligibility for monthly hospital schedules.
//!
//! Given a staff member's last leave and the schedule's policy, the
//! calculator answers which days of the month the next leave may fall on and
//! the validator accepts or rejects one proposed day. Everything here is a
//! pure function over timezone-naive calendar dates.

pub mod alerts;
pub mod calendar_date;
pub mod eligibility;
pub mod error;
pub mod history;
pub mod month_rules;
pub mod observer;
pub mod policy;
pub mod upcoming;
pub mod validator;

pub use eligibility::{compute_window, compute_window_observed, EligibilityWindow};
pub use error::EligibilityError;
pub use observer::{NoopObserver, TracingObserver, WindowObserver};
pub use policy::{Policy, StaffId, StaffLeaveHistory, DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS};
pub use validator::{validate, validate_iso, validate_observed, DayOccupancy, Outcome, ReasonCode, ValidationResult};
