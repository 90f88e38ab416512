//! `GET /diurnal` – mean temperature per hour of day.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::{render_table, run_blocking, AppState, TableFormat};
use crate::aggregate::compute_diurnal;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/diurnal", get(handler))
}

#[derive(Debug, Deserialize)]
struct DiurnalQuery {
    #[serde(default)]
    format: TableFormat,
}

async fn handler(
    Query(params): Query<DiurnalQuery>,
    State((store, _)): State<AppState>,
) -> Response {
    // ---
    info!("GET /diurnal over {} readings", store.len());

    match run_blocking(move || compute_diurnal(store.readings())).await {
        Ok(rows) => render_table(rows, params.format),
        Err(resp) => resp,
    }
}
