use thiserror::Error;

/// Malformed input reaching the eligibility core.
///
/// These are integration errors, not user-facing rejections. A rejected
/// leave date is a [`crate::validator::ValidationResult`], never one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EligibilityError {
    #[error("invalid policy: {reason}")]
    InvalidPolicy { reason: String },

    #[error("invalid leave history: {reason}")]
    InvalidHistory { reason: String },

    #[error("invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },
}

impl EligibilityError {
    pub(crate) fn policy(reason: impl Into<String>) -> Self {
        Self::InvalidPolicy { reason: reason.into() }
    }

    pub(crate) fn history(reason: impl Into<String>) -> Self {
        Self::InvalidHistory { reason: reason.into() }
    }
}
