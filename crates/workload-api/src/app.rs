//! Router assembly and HTTP middleware.

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, Request};
use axum::middleware;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes;
use crate::state::AppState;

/// Header carrying the per-request transaction id.
pub const TRANSACTION_ID_HEADER: &str = "x-transaction-id";

fn transaction_id_header() -> HeaderName {
    HeaderName::from_static(TRANSACTION_ID_HEADER)
}

/// Generates `TXN-<uuid>` ids for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTransactionId;

impl MakeRequestId for MakeTransactionId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&format!("TXN-{}", Uuid::new_v4()))
            .ok()
            .map(RequestId::new)
    }
}

fn is_blank(value: &HeaderValue) -> bool {
    value.as_bytes().iter().all(u8::is_ascii_whitespace)
}

/// Removes a blank `X-Transaction-Id` so a fresh one is generated.
async fn drop_blank_transaction_id(mut request: Request<Body>) -> Request<Body> {
    if request
        .headers()
        .get(TRANSACTION_ID_HEADER)
        .is_some_and(is_blank)
    {
        request.headers_mut().remove(TRANSACTION_ID_HEADER);
    }
    request
}

/// Builds the CORS layer. No origins means any origin is allowed.
///
/// # Errors
///
/// Returns `AppError::Config` if an origin is not a valid header value.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| AppError::Config(format!("invalid CORS origin {origin:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, transaction_id_header()])
        .expose_headers([transaction_id_header()]))
}

/// Assembles the full application: health and workload routes with the
/// transaction-id, trace and CORS layers.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/workload", routes::workload::router())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let transaction_id = request
                    .headers()
                    .get(TRANSACTION_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    transaction_id,
                )
            })
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(PropagateRequestIdLayer::new(transaction_id_header()))
        .layer(SetRequestIdLayer::new(
            transaction_id_header(),
            MakeTransactionId,
        ))
        .layer(middleware::map_request(drop_blank_transaction_id))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_transaction_ids_are_prefixed_and_unique() {
        let request = Request::new(());
        let mut make = MakeTransactionId;

        let first = make.make_request_id(&request).unwrap();
        let second = make.make_request_id(&request).unwrap();

        let first = first.header_value().to_str().unwrap();
        assert!(first.starts_with("TXN-"));
        assert_eq!(first.len(), "TXN-".len() + 36);
        assert_ne!(first, second.header_value().to_str().unwrap());
    }

    #[test]
    fn test_whitespace_only_transaction_ids_are_blank() {
        assert!(is_blank(&HeaderValue::from_static("")));
        assert!(is_blank(&HeaderValue::from_static("  \t ")));
        assert!(!is_blank(&HeaderValue::from_static(" TXN-1 ")));
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        let result = cors_layer(&["bad\norigin".to_owned()]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
