//! HTTP gateway for the result tables (EMBP).
//!
//! Each sibling module exports a subrouter; this gateway merges them and
//! attaches the shared state. Table rendering is shared here so every
//! endpoint speaks the same `format` query parameter.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::AnomalyConfig;
use crate::export::{write_json_lines, write_tsv, TabularRow};
use crate::ReadingStore;

mod anomalies;
mod diurnal;
mod health;
mod summary;
mod trend;

// ---

/// State shared by every route: the immutable store and the default
/// anomaly policy.
pub type AppState = (Arc<ReadingStore>, AnomalyConfig);

pub fn router(store: Arc<ReadingStore>, anomaly: AnomalyConfig) -> Router {
    // ---
    Router::new()
        .merge(trend::router())
        .merge(anomalies::router())
        .merge(diurnal::router())
        .merge(summary::router())
        .merge(health::router())
        .with_state((store, anomaly))
}

/// Output encoding for a result table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Json,
    Ndjson,
    Tsv,
}

/// JSON error body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    // ---
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Render rows in the requested format.
fn render_table<T: TabularRow>(rows: Vec<T>, format: TableFormat) -> Response {
    // ---
    let (content_type, written) = match format {
        TableFormat::Json => return (StatusCode::OK, Json(rows)).into_response(),
        TableFormat::Ndjson => {
            let mut buf = Vec::new();
            ("application/x-ndjson", write_json_lines(&rows, &mut buf).map(|_| buf))
        }
        TableFormat::Tsv => {
            let mut buf = Vec::new();
            ("text/tab-separated-values", write_tsv(&rows, &mut buf).map(|_| buf))
        }
    };

    match written {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode table: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode table")
        }
    }
}

/// Run a CPU-bound aggregation off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    // ---
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Aggregation task failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Aggregation failed")
    })
}
