//! Command handlers for the ledger context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load the bucket, resolve the delta, persist the
//! new snapshot.

use tracing::{info, instrument, warn};
use workload_core::command::Command;
use workload_core::error::DomainError;
use workload_core::repository::{BucketStore, WorkloadBucket};

use crate::domain::commands::UpdateTrainerWorkload;
use crate::domain::ledger;

/// How many times a caller is willing to re-run a command that lost an
/// optimistic concurrency race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRetry {
    max_attempts: u32,
}

impl ConflictRetry {
    /// Creates a policy allowing `max_attempts` total attempts (at least one).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Total attempts, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ConflictRetry {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Handles the `UpdateTrainerWorkload` command: loads (or synthesizes) the
/// bucket, applies the delta, and persists the result.
///
/// Performs exactly one store read and, only on success, one store write.
///
/// # Errors
///
/// Returns `DomainError::InsufficientDuration` or `DomainError::Overflow`
/// when the delta is rejected (nothing is written), and propagates store
/// failures unchanged.
#[instrument(
    skip(command, store),
    fields(
        trainer = %command.trainer_username,
        period = %command.period,
        command_type = command.command_type(),
    )
)]
pub async fn handle_update_workload(
    command: &UpdateTrainerWorkload,
    store: &dyn BucketStore,
) -> Result<WorkloadBucket, DomainError> {
    let current = store
        .find_by_key(&command.trainer_username, command.period)
        .await?
        .unwrap_or_else(|| ledger::empty_bucket_for(command));

    let next = ledger::resolve_delta(&current, command)?;
    let stored = store.upsert(&next).await?;

    info!(
        correlation_id = %command.correlation_id(),
        delta = command.delta_minutes,
        minutes = stored.accumulated_minutes,
        version = stored.version,
        "workload updated"
    );

    Ok(stored)
}

/// Runs `handle_update_workload`, re-running it from a fresh read when the
/// store reports a concurrency conflict. No other failure is retried.
///
/// # Errors
///
/// Returns the last error once `retry` is exhausted, or the first
/// non-conflict error.
pub async fn handle_update_workload_with_retry(
    command: &UpdateTrainerWorkload,
    store: &dyn BucketStore,
    retry: ConflictRetry,
) -> Result<WorkloadBucket, DomainError> {
    let mut attempt = 1;
    loop {
        match handle_update_workload(command, store).await {
            Err(DomainError::ConcurrencyConflict { .. }) if attempt < retry.max_attempts() => {
                warn!(
                    correlation_id = %command.correlation_id(),
                    attempt,
                    "concurrency conflict, retrying workload update"
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}
