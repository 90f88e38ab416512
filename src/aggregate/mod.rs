//! Statistical aggregation engine.
//!
//! Three independent, pure aggregations over the same immutable reading
//! set:
//! - `trend`   — mean temperature per sensor
//! - `anomaly` — rolling mean/stddev outlier detection per sensor
//! - `diurnal` — mean temperature per hour of day across all sensors
//!
//! None of them reads another's output, so [`summarize`] runs them side
//! by side on the rayon pool.

use serde::Serialize;
use tracing::instrument;

use crate::models::{AnomalyRecord, DiurnalResult, Reading, TrendResult};

pub mod anomaly;
pub mod diurnal;
pub mod trend;

pub use anomaly::{detect_anomalies, AnomalyConfig, Bounds, DEFAULT_K};
pub use diurnal::compute_diurnal;
pub use trend::compute_trend;

// ---

/// All three result tables computed from one reading set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub trend: Vec<TrendResult>,
    pub anomalies: Vec<AnomalyRecord>,
    pub diurnal: Vec<DiurnalResult>,
}

/// Run the three aggregators concurrently.
#[instrument(level = "debug", skip_all, fields(readings = readings.len()))]
pub fn summarize(readings: &[Reading], config: &AnomalyConfig) -> Summary {
    // ---
    let (trend, (anomalies, diurnal)) = rayon::join(
        || compute_trend(readings),
        || {
            rayon::join(
                || detect_anomalies(readings, config),
                || compute_diurnal(readings),
            )
        },
    );

    tracing::info!(
        "Summary: {} sensors, {} anomalies, {} hours",
        trend.len(),
        anomalies.len(),
        diurnal.len()
    );

    Summary {
        trend,
        anomalies,
        diurnal,
    }
}
