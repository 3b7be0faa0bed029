//! Wire form of a trainer workload change, shared by HTTP and the event
//! listener.

use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;
use workload_core::period::Period;
use workload_core::repository::TrainerProfile;
use workload_ledger::domain::commands::{ActionType, UpdateTrainerWorkload};

use crate::error::FieldErrors;

/// A workload change as submitted by a client or carried by an event.
///
/// Every field is optional on the wire so that missing values are reported
/// per field instead of failing the whole decode.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerWorkloadPayload {
    /// The trainer's username.
    pub trainer_username: Option<String>,
    /// The trainer's first name.
    pub trainer_firstname: Option<String>,
    /// The trainer's last name.
    pub trainer_lastname: Option<String>,
    /// Whether the trainer is active.
    pub is_active: Option<bool>,
    /// Local date-time of the training session.
    pub training_date: Option<NaiveDateTime>,
    /// Session length in minutes.
    #[serde(alias = "trainingDurationMin")]
    pub training_duration_minutes: Option<i64>,
    /// Whether the minutes are added or removed.
    pub action_type: Option<ActionType>,
    /// Correlation token supplied by the producer.
    pub transaction_id: Option<String>,
}

fn required_text(
    value: Option<String>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            errors.insert(field.to_owned(), "must not be blank".to_owned());
            None
        }
    }
}

fn required<T>(value: Option<T>, field: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() {
        errors.insert(field.to_owned(), "is required".to_owned());
    }
    value
}

fn duration(value: Option<i64>, errors: &mut FieldErrors) -> Option<u32> {
    const FIELD: &str = "trainingDurationMinutes";
    let minutes = required(value, FIELD, errors)?;
    if minutes < 1 {
        errors.insert(FIELD.to_owned(), "must be at least 1".to_owned());
        return None;
    }
    if let Ok(minutes) = u32::try_from(minutes) {
        Some(minutes)
    } else {
        errors.insert(FIELD.to_owned(), format!("must not exceed {}", u32::MAX));
        None
    }
}

impl TrainerWorkloadPayload {
    /// Validates every field and normalizes the payload into a ledger command.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn into_command(self, correlation_id: Uuid) -> Result<UpdateTrainerWorkload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required_text(self.trainer_username, "trainerUsername", &mut errors);
        let first_name = required_text(self.trainer_firstname, "trainerFirstname", &mut errors);
        let last_name = required_text(self.trainer_lastname, "trainerLastname", &mut errors);
        let is_active = required(self.is_active, "isActive", &mut errors);
        let period = match required(self.training_date, "trainingDate", &mut errors) {
            Some(date) => match Period::from_training_date(date) {
                Ok(period) => Some(period),
                Err(e) => {
                    errors.insert("trainingDate".to_owned(), e.to_string());
                    None
                }
            },
            None => None,
        };
        let delta_minutes = duration(self.training_duration_minutes, &mut errors);
        let action = required(self.action_type, "actionType", &mut errors);

        match (
            username,
            first_name,
            last_name,
            is_active,
            period,
            delta_minutes,
            action,
        ) {
            (
                Some(trainer_username),
                Some(first_name),
                Some(last_name),
                Some(is_active),
                Some(period),
                Some(delta_minutes),
                Some(action),
            ) if errors.is_empty() => Ok(UpdateTrainerWorkload {
                correlation_id,
                trainer_username,
                profile: TrainerProfile {
                    first_name,
                    last_name,
                    is_active,
                },
                period,
                delta_minutes,
                action,
            }),
            _ => Err(errors),
        }
    }
}
