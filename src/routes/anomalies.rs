//! `GET /anomalies` – readings outside `k` rolling standard deviations.
//!
//! The service-wide anomaly policy can be overridden per request with the
//! `k` and `window` query parameters.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{error_response, render_table, run_blocking, AppState, TableFormat};
use crate::aggregate::{detect_anomalies, AnomalyConfig};
use crate::models::AnomalyRecord;
use crate::stats::WindowPolicy;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/anomalies", get(handler))
}

/// Query parameters for the anomaly table.
#[derive(Debug, Deserialize)]
struct AnomalyQuery {
    /// Standard deviation multiple, overrides `ANOMALY_K`.
    k: Option<f64>,
    /// Rolling window size, 0 = cumulative; overrides `ANOMALY_WINDOW`.
    window: Option<usize>,
    sensor_id: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    format: TableFormat,
}

async fn handler(
    Query(params): Query<AnomalyQuery>,
    State((store, defaults)): State<AppState>,
) -> Response {
    // ---
    let config = match resolve_config(&params, defaults) {
        Ok(config) => config,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    info!(
        "GET /anomalies k={} window={:?} over {} readings",
        config.k(),
        config.window(),
        store.len()
    );

    match run_blocking(move || detect_anomalies(store.readings(), &config)).await {
        Ok(rows) => render_table(apply_filters(rows, &params), params.format),
        Err(resp) => resp,
    }
}

fn resolve_config(params: &AnomalyQuery, defaults: AnomalyConfig) -> Result<AnomalyConfig, String> {
    // ---
    let k = params.k.unwrap_or(defaults.k());
    let window = params
        .window
        .map(WindowPolicy::from_size)
        .unwrap_or(defaults.window());

    AnomalyConfig::new(k, window).map_err(|e| e.to_string())
}

/// Filters are applied after detection: rolling statistics always see the
/// sensor's full history.
fn apply_filters(rows: Vec<AnomalyRecord>, params: &AnomalyQuery) -> Vec<AnomalyRecord> {
    // ---
    debug!("Apply filter: {:?}", params);
    rows.into_iter()
        .filter(|r| {
            params
                .sensor_id
                .as_ref()
                .map_or(true, |id| &r.sensor_id == id)
        })
        .take(params.limit.unwrap_or(usize::MAX))
        .collect()
}
