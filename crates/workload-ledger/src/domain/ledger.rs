//! Delta resolution against a single workload bucket.

use workload_core::error::DomainError;
use workload_core::repository::{MAX_ACCUMULATED_MINUTES, WorkloadBucket};

use super::commands::{ActionType, UpdateTrainerWorkload};

/// Synthesizes the empty bucket a command targets when the store has none.
#[must_use]
pub fn empty_bucket_for(command: &UpdateTrainerWorkload) -> WorkloadBucket {
    WorkloadBucket::new(
        command.trainer_username.clone(),
        command.period,
        command.profile.clone(),
    )
}

/// Applies a command's delta to `bucket`, returning the next snapshot.
///
/// The returned bucket carries the command's profile. `bucket` itself is
/// never modified.
///
/// # Errors
///
/// Returns `DomainError::InsufficientDuration` if a DELETE would take the
/// bucket below zero, and `DomainError::Overflow` if an ADD would exceed
/// `MAX_ACCUMULATED_MINUTES`.
pub fn resolve_delta(
    bucket: &WorkloadBucket,
    command: &UpdateTrainerWorkload,
) -> Result<WorkloadBucket, DomainError> {
    let available = bucket.accumulated_minutes;
    let requested = command.delta_minutes;

    let minutes = match command.action {
        ActionType::Add => available
            .checked_add(requested)
            .filter(|total| *total <= MAX_ACCUMULATED_MINUTES)
            .ok_or_else(|| DomainError::Overflow {
                trainer_username: bucket.trainer_username.clone(),
                period: bucket.period,
                requested,
                available,
            })?,
        ActionType::Delete => {
            available
                .checked_sub(requested)
                .ok_or_else(|| DomainError::InsufficientDuration {
                    trainer_username: bucket.trainer_username.clone(),
                    period: bucket.period,
                    requested,
                    available,
                })?
        }
    };

    Ok(bucket
        .with_accumulated_minutes(minutes)
        .with_profile(command.profile.clone()))
}
