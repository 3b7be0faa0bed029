//! API error types.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, error, warn};
use workload_core::error::DomainError;

use crate::auth::AuthError;

/// Field name to validation message, in field order.
pub type FieldErrors = BTreeMap<String, String>;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Per-field validation messages, present only for invalid payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A failure reported by the ledger or the store.
    Domain(DomainError),
    /// The request was not authenticated.
    Auth(AuthError),
    /// The request body failed field validation.
    InvalidFields(FieldErrors),
    /// The request body could not be decoded at all.
    MalformedBody(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::InsufficientDuration { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_duration")
        }
        DomainError::Overflow { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "duration_overflow"),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::ConcurrencyConflict { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "concurrency_conflict")
        }
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Domain(err) => {
                let (status, error_code) = domain_status(&err);
                (
                    status,
                    ErrorBody {
                        error: error_code,
                        message: err.to_string(),
                        fields: None,
                    },
                )
            }
            Self::Auth(err) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized",
                    message: err.to_string(),
                    fields: None,
                },
            ),
            Self::InvalidFields(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation_error",
                    message: "request validation failed".to_owned(),
                    fields: Some(fields),
                },
            ),
            Self::MalformedBody(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation_error",
                    message,
                    fields: None,
                },
            ),
        };

        match log_level(status) {
            Some(level) if level == Level::ERROR => {
                error!(%status, error = body.error, message = %body.message, "request failed");
            }
            Some(_) => {
                warn!(%status, error = body.error, message = %body.message, "request rejected");
            }
            None => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Severity an error response is logged at: `ERROR` for 5xx, `WARN` for 4xx.
fn log_level(status: StatusCode) -> Option<Level> {
    if status.is_server_error() {
        Some(Level::ERROR)
    } else if status.is_client_error() {
        Some(Level::WARN)
    } else {
        None
    }
}
