//! Liveness and readiness endpoints.

use axum::{
    Json, Router,
    http::{HeaderMap, header::HOST},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use crate::AppState;

/// Liveness probe.
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

/// Readiness probe, echoing the host the request was addressed to.
async fn ready(headers: HeaderMap) -> impl IntoResponse {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Json(json!({ "host": host }))
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready))
}
