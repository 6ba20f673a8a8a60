use folga_core::{EligibilityError, ValidationResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The validator said no. Carries the structured result so callers can
    /// show the earliest eligible date.
    #[error("leave rejected: {}", .0.message())]
    Rejected(ValidationResult),

    #[error("{0}")]
    Business(String),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub(crate) fn business(message: impl Into<String>) -> Self {
        Self::Business(message.into())
    }
}
