//! Workload bucket entity and the bucket store port.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::period::Period;

/// Largest duration a single bucket may accumulate. Matches the width of the
/// persisted column.
pub const MAX_ACCUMULATED_MINUTES: u32 = i32::MAX.unsigned_abs();

/// Trainer profile fields denormalized onto every bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerProfile {
    /// The trainer's first name.
    pub first_name: String,
    /// The trainer's last name.
    pub last_name: String,
    /// Whether the trainer is currently active.
    pub is_active: bool,
}

/// Accumulated training minutes for one trainer in one calendar month.
///
/// Buckets are immutable snapshots: the ledger derives a new snapshot with
/// the `with_*` functions and hands it back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadBucket {
    /// Surrogate identifier assigned by the store on first persistence.
    pub id: Option<i64>,
    /// Optimistic concurrency version. `0` until first persisted.
    pub version: i64,
    /// The trainer this bucket belongs to.
    pub trainer_username: String,
    /// The calendar month this bucket accumulates.
    pub period: Period,
    /// Profile snapshot taken from the latest successful command.
    pub profile: TrainerProfile,
    /// Total minutes trained in the period.
    pub accumulated_minutes: u32,
}

impl WorkloadBucket {
    /// Creates an unpersisted, empty bucket for the given key.
    #[must_use]
    pub fn new(trainer_username: impl Into<String>, period: Period, profile: TrainerProfile) -> Self {
        Self {
            id: None,
            version: 0,
            trainer_username: trainer_username.into(),
            period,
            profile,
            accumulated_minutes: 0,
        }
    }

    /// Returns a copy of this bucket holding `minutes`.
    #[must_use]
    pub fn with_accumulated_minutes(&self, minutes: u32) -> Self {
        Self {
            accumulated_minutes: minutes,
            ..self.clone()
        }
    }

    /// Returns this bucket with its profile snapshot replaced.
    #[must_use]
    pub fn with_profile(self, profile: TrainerProfile) -> Self {
        Self { profile, ..self }
    }

    /// Whether the store has assigned an identity to this bucket yet.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Persistence port for workload buckets.
///
/// Implementations must enforce uniqueness of `(trainer_username, period)`
/// and reject stale writes with `DomainError::ConcurrencyConflict`.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Finds the bucket for a trainer and period. A miss is `Ok(None)`.
    async fn find_by_key(
        &self,
        trainer_username: &str,
        period: Period,
    ) -> Result<Option<WorkloadBucket>, DomainError>;

    /// Lists every bucket of a trainer, ascending by `(year, month)`.
    /// Returns an empty vector when the trainer has no buckets.
    async fn list_by_trainer_ordered(
        &self,
        trainer_username: &str,
    ) -> Result<Vec<WorkloadBucket>, DomainError>;

    /// Inserts a bucket without an id, or updates a persisted bucket whose
    /// version still matches. Returns the stored snapshot with its id and
    /// new version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` when an insert collides
    /// with an existing key or an update observes a newer version.
    async fn upsert(&self, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError>;
}
