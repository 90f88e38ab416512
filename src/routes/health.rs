//! `GET /health` – liveness probe.
//!
//! Reports the size of the loaded reading set alongside the status so a
//! deployment check can tell an empty store from a populated one. Never
//! runs an aggregation.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    readings: usize,
}

async fn health(State((store, _)): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        readings: store.len(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
