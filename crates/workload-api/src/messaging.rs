//! Intake of training events from a message transport.
//!
//! The listener is transport-agnostic: a consumer loop hands it raw payload
//! bytes with their delivery coordinates and acts on the returned
//! disposition. `Ok` means the message may be acknowledged; `Err` means it
//! must be redelivered.
//!
//! No consumer loop lives in this crate and the server binary does not start
//! one. Whatever process owns the broker connection embeds a
//! `TrainingEventListener` and drives it.

use std::sync::Arc;

use tracing::{Span, error, info, instrument};
use uuid::Uuid;
use workload_core::error::DomainError;
use workload_core::repository::{BucketStore, WorkloadBucket};
use workload_ledger::application::command_handlers::{self, ConflictRetry};

use crate::payload::TrainerWorkloadPayload;

/// Where a message was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Partition the message was consumed from.
    pub partition: i32,
    /// Offset of the message within its partition.
    pub offset: i64,
}

/// Outcome of a message the transport may acknowledge.
#[derive(Debug)]
pub enum Disposition {
    /// The event was applied and the bucket committed.
    Committed(WorkloadBucket),
    /// The event can never succeed and was dropped, with the reason.
    Rejected(String),
}

/// Applies training events to the ledger.
#[derive(Clone)]
pub struct TrainingEventListener {
    store: Arc<dyn BucketStore>,
    retry: ConflictRetry,
}

impl TrainingEventListener {
    /// Creates a listener writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn BucketStore>, retry: ConflictRetry) -> Self {
        Self { store, retry }
    }

    /// Decodes and applies one message.
    ///
    /// # Errors
    ///
    /// Returns the `DomainError` of a system fault (infrastructure failure or
    /// exhausted concurrency retries). The message must be redelivered.
    #[instrument(
        skip(self, payload),
        fields(
            partition = delivery.partition,
            offset = delivery.offset,
            transaction_id = tracing::field::Empty,
        )
    )]
    pub async fn on_message(
        &self,
        payload: &[u8],
        delivery: Delivery,
    ) -> Result<Disposition, DomainError> {
        let event: TrainerWorkloadPayload = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(err) => {
                error!(error = %err, "dropping malformed training event");
                return Ok(Disposition::Rejected(format!("malformed payload: {err}")));
            }
        };
        if let Some(transaction_id) = &event.transaction_id {
            Span::current().record("transaction_id", transaction_id.as_str());
        }

        let command = match event.into_command(Uuid::new_v4()) {
            Ok(command) => command,
            Err(fields) => {
                let reason = fields
                    .iter()
                    .map(|(field, message)| format!("{field} {message}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                error!(%reason, "dropping invalid training event");
                return Ok(Disposition::Rejected(reason));
            }
        };

        match command_handlers::handle_update_workload_with_retry(
            &command,
            self.store.as_ref(),
            self.retry,
        )
        .await
        {
            Ok(bucket) => {
                info!(
                    trainer = %bucket.trainer_username,
                    period = %bucket.period,
                    minutes = bucket.accumulated_minutes,
                    "training event applied"
                );
                Ok(Disposition::Committed(bucket))
            }
            Err(err) if err.is_business_failure() => {
                error!(error = %err, "training event rejected");
                Ok(Disposition::Rejected(err.to_string()))
            }
            Err(err) => {
                error!(error = %err, "training event failed, awaiting redelivery");
                Err(err)
            }
        }
    }
}
