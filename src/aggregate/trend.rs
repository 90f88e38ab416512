//! Per-sensor mean temperature over the whole observation window.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::models::{Reading, TrendResult};
use crate::stats::RunningStats;

// ---

/// One row per distinct sensor, ascending by sensor id.
#[instrument(level = "debug", skip_all, fields(readings = readings.len()))]
pub fn compute_trend(readings: &[Reading]) -> Vec<TrendResult> {
    // ---
    let mut by_sensor: BTreeMap<&str, RunningStats> = BTreeMap::new();
    for r in readings {
        by_sensor.entry(r.sensor_id()).or_default().push(r.temperature());
    }

    let rows: Vec<TrendResult> = by_sensor
        .into_iter()
        .filter_map(|(sensor_id, stats)| {
            stats.mean().map(|mean_temperature| TrendResult {
                sensor_id: sensor_id.to_string(),
                mean_temperature,
                reading_count: stats.count(),
            })
        })
        .collect();

    tracing::debug!("Computed trend for {} sensors", rows.len());
    rows
}
