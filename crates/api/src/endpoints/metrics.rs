//! Metrics and probe endpoints.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use updown_common::metrics::{MetricsSnapshot, get_metrics};

use crate::middleware::AppState;

/// Snapshot of the counters as JSON.
async fn snapshot() -> Json<MetricsSnapshot> {
    Json(get_metrics().snapshot())
}

/// Counters in Prometheus text exposition format.
async fn prometheus() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics().to_prometheus(),
    )
        .into_response()
}

/// Liveness probe.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe.
async fn ready() -> impl IntoResponse {
    Json(json!({ "status": "ready" }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(snapshot))
        .route("/prometheus", get(prometheus))
        .route("/health", get(health))
        .route("/ready", get(ready))
}
