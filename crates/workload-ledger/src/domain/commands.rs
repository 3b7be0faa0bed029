//! Commands for the ledger context.

use serde::Deserialize;
use uuid::Uuid;
use workload_core::command::Command;
use workload_core::period::Period;
use workload_core::repository::TrainerProfile;

/// Direction in which a command moves a bucket's accumulated minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    /// Add the delta to the bucket.
    Add,
    /// Remove the delta from the bucket.
    Delete,
}

/// Command to add or remove training minutes for a trainer's month.
#[derive(Debug, Clone)]
pub struct UpdateTrainerWorkload {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The trainer whose workload changes.
    pub trainer_username: String,
    /// Profile snapshot carried by the command.
    pub profile: TrainerProfile,
    /// The month the training took place in.
    pub period: Period,
    /// Magnitude of the change, at least one minute.
    pub delta_minutes: u32,
    /// Whether the delta is added or removed.
    pub action: ActionType,
}

impl Command for UpdateTrainerWorkload {
    fn command_type(&self) -> &'static str {
        match self.action {
            ActionType::Add => "workload.add_minutes",
            ActionType::Delete => "workload.delete_minutes",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
