//! Query handlers for the ledger context.

use tracing::instrument;
use workload_core::error::DomainError;
use workload_core::repository::BucketStore;

use crate::domain::summary::{self, TrainerSummary};

/// Retrieves the year/month workload summary for a trainer.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the trainer has no buckets, and
/// propagates store failures unchanged.
#[instrument(skip(store))]
pub async fn get_trainer_summary(
    trainer_username: &str,
    store: &dyn BucketStore,
) -> Result<TrainerSummary, DomainError> {
    let buckets = store.list_by_trainer_ordered(trainer_username).await?;
    summary::build_summary(trainer_username, &buckets)
}
