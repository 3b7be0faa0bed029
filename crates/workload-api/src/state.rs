//! Shared application state.

use std::sync::Arc;

use workload_core::repository::BucketStore;
use workload_ledger::application::command_handlers::ConflictRetry;

use crate::auth::TokenValidator;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bucket store backing the ledger.
    pub bucket_store: Arc<dyn BucketStore>,
    /// Validator applied to bearer tokens.
    pub token_validator: Arc<dyn TokenValidator>,
    /// Retry policy for commands that lose an optimistic concurrency race.
    pub conflict_retry: ConflictRetry,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        bucket_store: Arc<dyn BucketStore>,
        token_validator: Arc<dyn TokenValidator>,
        conflict_retry: ConflictRetry,
    ) -> Self {
        Self {
            bucket_store,
            token_validator,
            conflict_retry,
        }
    }
}
