//! Routes for recording and reporting trainer workload.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;
use workload_core::repository::WorkloadBucket;
use workload_ledger::application::{command_handlers, query_handlers};
use workload_ledger::domain::summary::TrainerSummary;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::payload::TrainerWorkloadPayload;
use crate::state::AppState;

/// Response body returned after a workload change is committed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadUpdatedResponse {
    /// The trainer whose bucket changed.
    pub trainer_username: String,
    /// Year of the bucket.
    pub year: i32,
    /// Upper-case month name of the bucket.
    pub month: &'static str,
    /// Minutes accumulated after the change.
    pub training_duration_minutes: u32,
}

impl From<WorkloadBucket> for WorkloadUpdatedResponse {
    fn from(bucket: WorkloadBucket) -> Self {
        Self {
            year: bucket.period.year(),
            month: bucket.period.month_name(),
            training_duration_minutes: bucket.accumulated_minutes,
            trainer_username: bucket.trainer_username,
        }
    }
}

/// One month of a summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthResponse {
    /// Upper-case month name.
    pub month: &'static str,
    /// Minutes accumulated in the month.
    pub training_summary_duration: u32,
}

/// One year of a summary.
#[derive(Debug, Serialize)]
pub struct YearResponse {
    /// The calendar year.
    pub year: i32,
    /// Months in ascending order.
    pub months: Vec<MonthResponse>,
}

/// Response body for GET /{username}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSummaryResponse {
    /// The trainer's username.
    pub username: String,
    /// The trainer's first name.
    pub first_name: String,
    /// The trainer's last name.
    pub last_name: String,
    /// Whether the trainer is active.
    pub status: bool,
    /// Years in ascending order.
    pub years: Vec<YearResponse>,
}

impl From<TrainerSummary> for TrainerSummaryResponse {
    fn from(summary: TrainerSummary) -> Self {
        Self {
            username: summary.username,
            first_name: summary.first_name,
            last_name: summary.last_name,
            status: summary.is_active,
            years: summary
                .years
                .into_iter()
                .map(|year| YearResponse {
                    year: year.year,
                    months: year
                        .months
                        .into_iter()
                        .map(|month| MonthResponse {
                            month: month.month_name,
                            training_summary_duration: month.minutes,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// POST /
#[instrument(skip_all, fields(subject = %principal.subject))]
async fn update_workload(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<TrainerWorkloadPayload>, JsonRejection>,
) -> Result<Json<WorkloadUpdatedResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    let command = payload
        .into_command(Uuid::new_v4())
        .map_err(ApiError::InvalidFields)?;

    info!(
        correlation_id = %command.correlation_id,
        trainer = %command.trainer_username,
        period = %command.period,
        "handling workload update"
    );

    let bucket = command_handlers::handle_update_workload_with_retry(
        &command,
        state.bucket_store.as_ref(),
        state.conflict_retry,
    )
    .await?;

    Ok(Json(bucket.into()))
}

/// GET /{username}
#[instrument(skip(state, _principal))]
async fn get_trainer_summary(
    _principal: Authenticated,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<TrainerSummaryResponse>, ApiError> {
    let summary =
        query_handlers::get_trainer_summary(&username, state.bucket_store.as_ref()).await?;

    Ok(Json(summary.into()))
}

/// Returns the router for the workload context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(update_workload))
        .route("/{username}", get(get_trainer_summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::Value;
    use tower::ServiceExt;
    use workload_core::period::Period;
    use workload_core::repository::{BucketStore, TrainerProfile};
    use workload_ledger::application::command_handlers::ConflictRetry;
    use workload_test_support::{
        ConflictingBucketStore, FailingBucketStore, FixedClock, InMemoryBucketStore,
    };

    use crate::auth::JwtTokenValidator;

    const SECRET: &[u8] = b"route-test-secret-with-enough-bytes";

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn app_state_with(bucket_store: Arc<dyn BucketStore>) -> AppState {
        let validator = JwtTokenValidator::new(SECRET, Arc::new(FixedClock(now())));
        AppState::new(bucket_store, Arc::new(validator), ConflictRetry::default())
    }

    fn bearer(exp_offset_seconds: i64) -> String {
        let claims = serde_json::json!({
            "sub": "admin",
            "iat": now().timestamp(),
            "exp": now().timestamp() + exp_offset_seconds,
        });
        let token =
            jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
                .unwrap();
        format!("Bearer {token}")
    }

    fn workload_body(action: &str, minutes: i64) -> Value {
        serde_json::json!({
            "trainerUsername": "john.smith",
            "trainerFirstname": "John",
            "trainerLastname": "Smith",
            "isActive": true,
            "trainingDate": "2025-01-15T10:00:00",
            "trainingDurationMinutes": minutes,
            "actionType": action
        })
    }

    fn post_request(body: &Value, authorization: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", bearer(3_600))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    fn seeded(minutes: u32) -> Arc<InMemoryBucketStore> {
        Arc::new(InMemoryBucketStore::with_buckets(vec![
            WorkloadBucket::new(
                "john.smith",
                Period::new(2025, 1).unwrap(),
                TrainerProfile {
                    first_name: "John".into(),
                    last_name: "Smith".into(),
                    is_active: true,
                },
            )
            .with_accumulated_minutes(minutes),
        ]))
    }

    #[tokio::test]
    async fn test_add_returns_200_with_accumulated_minutes() {
        // Arrange
        let store = Arc::new(InMemoryBucketStore::new());
        let app = router().with_state(app_state_with(store.clone()));
        let request = post_request(&workload_body("ADD", 60), Some(bearer(3_600)));

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["trainerUsername"], "john.smith");
        assert_eq!(json["year"], 2025);
        assert_eq!(json["month"], "JANUARY");
        assert_eq!(json["trainingDurationMinutes"], 60);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_beyond_balance_returns_422() {
        // Arrange
        let store = seeded(100);
        let app = router().with_state(app_state_with(store.clone()));
        let request = post_request(&workload_body("DELETE", 150), Some(bearer(3_600)));

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"], "insufficient_duration");
        assert_eq!(
            store
                .get("john.smith", Period::new(2025, 1).unwrap())
                .unwrap()
                .accumulated_minutes,
            100
        );
    }

    #[tokio::test]
    async fn test_invalid_fields_return_400_with_field_messages() {
        let app = router().with_state(app_state_with(Arc::new(InMemoryBucketStore::new())));
        let request = post_request(&workload_body("ADD", 0), Some(bearer(3_600)));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(
            json["fields"]["trainingDurationMinutes"],
            "must be at least 1"
        );
    }

    #[tokio::test]
    async fn test_unparseable_body_returns_400() {
        let app = router().with_state(app_state_with(Arc::new(InMemoryBucketStore::new())));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .header("authorization", bearer(3_600))
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let store = Arc::new(InMemoryBucketStore::new());
        let app = router().with_state(app_state_with(store.clone()));
        let request = post_request(&workload_body("ADD", 60), None);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "unauthorized");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_returns_401() {
        let app = router().with_state(app_state_with(Arc::new(InMemoryBucketStore::new())));
        let request = post_request(&workload_body("ADD", 60), Some(bearer(-60)));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_post_returns_503_when_conflicts_outlast_retries() {
        // Arrange
        let store = Arc::new(ConflictingBucketStore::new(10));
        let app = router().with_state(app_state_with(store.clone()));
        let request = post_request(&workload_body("ADD", 60), Some(bearer(3_600)));

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "concurrency_conflict");
        assert!(store.inner().is_empty());
    }

    #[tokio::test]
    async fn test_post_returns_500_when_store_fails() {
        let app = router().with_state(app_state_with(Arc::new(FailingBucketStore)));
        let request = post_request(&workload_body("ADD", 60), Some(bearer(3_600)));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_summary_returns_200_with_years_and_months() {
        // Arrange
        let app = router().with_state(app_state_with(seeded(120)));

        // Act
        let response = app.oneshot(get_request("/john.smith")).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["username"], "john.smith");
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["lastName"], "Smith");
        assert_eq!(json["status"], true);
        assert_eq!(json["years"][0]["year"], 2025);
        assert_eq!(json["years"][0]["months"][0]["month"], "JANUARY");
        assert_eq!(json["years"][0]["months"][0]["trainingSummaryDuration"], 120);
    }

    #[tokio::test]
    async fn test_summary_for_unknown_trainer_returns_404() {
        let app = router().with_state(app_state_with(Arc::new(InMemoryBucketStore::new())));

        let response = app.oneshot(get_request("/nonexistent.user")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_summary_requires_token() {
        let app = router().with_state(app_state_with(seeded(120)));
        let request = Request::builder()
            .method("GET")
            .uri("/john.smith")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
