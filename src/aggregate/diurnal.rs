//! Hour-of-day temperature profile across all sensors.

use chrono::Timelike;
use tracing::instrument;

use crate::models::{DiurnalResult, Reading};
use crate::stats::RunningStats;

// ---

/// One row per hour value present in the input, ascending by hour.
///
/// The hour is read from the reading's own wall clock; no timezone is
/// applied beyond what the timestamp already encodes.
#[instrument(level = "debug", skip_all, fields(readings = readings.len()))]
pub fn compute_diurnal(readings: &[Reading]) -> Vec<DiurnalResult> {
    // ---
    let mut by_hour = [RunningStats::default(); 24];
    for r in readings {
        by_hour[r.timestamp().hour() as usize].push(r.temperature());
    }

    by_hour
        .iter()
        .zip(0u32..)
        .filter_map(|(stats, hour)| {
            stats.mean().map(|mean_temperature| DiurnalResult {
                hour,
                mean_temperature,
                reading_count: stats.count(),
            })
        })
        .collect()
}
