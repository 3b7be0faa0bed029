//! Domain error types.

use thiserror::Error;

use crate::period::Period;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A DELETE would drive the accumulated duration below zero.
    #[error(
        "cannot delete {requested} minutes from {trainer_username}/{}/{}: current duration is {available} minutes",
        .period.year(),
        .period.month_name()
    )]
    InsufficientDuration {
        /// The trainer whose bucket was targeted.
        trainer_username: String,
        /// The targeted period.
        period: Period,
        /// Minutes the command asked to remove.
        requested: u32,
        /// Minutes currently accumulated.
        available: u32,
    },

    /// An ADD would exceed the largest duration a bucket can hold.
    #[error(
        "cannot add {requested} minutes to {trainer_username}/{}/{}: current duration {available} would overflow",
        .period.year(),
        .period.month_name()
    )]
    Overflow {
        /// The trainer whose bucket was targeted.
        trainer_username: String,
        /// The targeted period.
        period: Period,
        /// Minutes the command asked to add.
        requested: u32,
        /// Minutes currently accumulated.
        available: u32,
    },

    /// No workload has been recorded for the trainer.
    #[error("no workload found for trainer: {0}")]
    NotFound(String),

    /// Optimistic concurrency conflict on a bucket.
    #[error("concurrency conflict on workload {trainer_username}/{period}")]
    ConcurrencyConflict {
        /// The trainer whose bucket was contended.
        trainer_username: String,
        /// The contended period.
        period: Period,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether the failure is an expected business outcome the caller can
    /// correct, as opposed to a system fault worth retrying.
    #[must_use]
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            Self::InsufficientDuration { .. }
                | Self::Overflow { .. }
                | Self::NotFound(_)
                | Self::Validation(_)
        )
    }
}
