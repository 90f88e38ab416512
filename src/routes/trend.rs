//! `GET /trend` – mean temperature per sensor.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::{render_table, run_blocking, AppState, TableFormat};
use crate::aggregate::compute_trend;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/trend", get(handler))
}

#[derive(Debug, Deserialize)]
struct TrendQuery {
    #[serde(default)]
    format: TableFormat,
}

async fn handler(
    Query(params): Query<TrendQuery>,
    State((store, _)): State<AppState>,
) -> Response {
    // ---
    info!("GET /trend over {} readings", store.len());

    match run_blocking(move || compute_trend(store.readings())).await {
        Ok(rows) => render_table(rows, params.format),
        Err(resp) => resp,
    }
}
