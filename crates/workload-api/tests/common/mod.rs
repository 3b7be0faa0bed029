//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use workload_core::repository::BucketStore;
use workload_ledger::application::command_handlers::ConflictRetry;
use workload_store::pg_bucket_store::PgBucketStore;
use workload_test_support::FixedClock;

use workload_api::app;
use workload_api::auth::JwtTokenValidator;
use workload_api::state::AppState;

const SECRET: &[u8] = b"integration-test-secret-32-bytes-long";

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Build the full app router over `bucket_store` with a fixed clock. Uses the
/// same router assembly as `main.rs`.
pub fn build_app_with_store(bucket_store: Arc<dyn BucketStore>) -> Router {
    let validator = JwtTokenValidator::new(SECRET, Arc::new(FixedClock(fixed_now())));
    let app_state = AppState::new(bucket_store, Arc::new(validator), ConflictRetry::default());
    app::build_router(app_state, CorsLayer::permissive())
}

/// Build the full app router with a real `PgBucketStore`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_with_store(Arc::new(PgBucketStore::new(pool)))
}

/// A bearer token for `admin`, valid for an hour after `fixed_now`.
pub fn bearer() -> String {
    let claims = serde_json::json!({
        "sub": "admin",
        "iat": fixed_now().timestamp(),
        "exp": fixed_now().timestamp() + 3_600,
    });
    let token =
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap();
    format!("Bearer {token}")
}

/// A workload change body for john.smith in January 2025.
pub fn workload_body(action: &str, minutes: i64) -> serde_json::Value {
    workload_body_for("2025-01-15T10:00:00", action, minutes)
}

/// A workload change body for john.smith on `training_date`.
pub fn workload_body_for(training_date: &str, action: &str, minutes: i64) -> serde_json::Value {
    serde_json::json!({
        "trainerUsername": "john.smith",
        "trainerFirstname": "John",
        "trainerLastname": "Smith",
        "isActive": true,
        "trainingDate": training_date,
        "trainingDurationMinutes": minutes,
        "actionType": action
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, headers, json)
}

/// Send an authenticated POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", bearer())
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let (status, _, json) = send(app, request).await;
    (status, json)
}

/// Send an authenticated GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", bearer())
        .body(Body::empty())
        .unwrap();

    let (status, _, json) = send(app, request).await;
    (status, json)
}

/// Send a GET request with extra headers and no token, returning headers too.
pub async fn get_with_headers(
    app: Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}
