//! `GET /summary` – all three tables in one JSON document.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::info;

use super::{run_blocking, AppState};
use crate::aggregate::summarize;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/summary", get(handler))
}

async fn handler(State((store, config)): State<AppState>) -> Response {
    // ---
    info!("GET /summary over {} readings", store.len());

    match run_blocking(move || summarize(store.readings(), &config)).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(resp) => resp,
    }
}
