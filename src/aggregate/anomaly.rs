//! Rolling-statistics anomaly detection.
//!
//! Each sensor's readings are replayed in timestamp order through a
//! [`RollingWindow`]. A reading is anomalous when it lies strictly outside
//! `rolling_mean ± k·rolling_stddev`, where the statistics include the
//! reading itself.
//!
//! A rolling standard deviation is undefined until the window holds two
//! samples. Such positions produce no bounds at all and are never
//! reported, so the first reading of every sensor is never an anomaly.
//! This is decided through `Option`, not through NaN comparisons.

use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::error::InvalidCoefficient;
use crate::models::{AnomalyRecord, Reading};
use crate::stats::{RollingWindow, RunningStats, WindowPolicy};
use crate::store::partition_by_sensor;

// ---

/// Default number of standard deviations a reading may stray.
pub const DEFAULT_K: f64 = 2.0;

/// Tunable detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyConfig {
    k: f64,
    window: WindowPolicy,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            window: WindowPolicy::Cumulative,
        }
    }
}

impl AnomalyConfig {
    // ---
    pub fn new(k: f64, window: WindowPolicy) -> Result<Self, InvalidCoefficient> {
        // ---
        if !k.is_finite() || k <= 0.0 {
            return Err(InvalidCoefficient(k));
        }
        Ok(Self { k, window })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn window(&self) -> WindowPolicy {
        self.window
    }
}

/// Acceptance band derived from one rolling-statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub mean: f64,
    pub stddev: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Bounds {
    /// `None` while the spread is undefined (fewer than two samples).
    pub fn from_stats(stats: &RunningStats, k: f64) -> Option<Self> {
        // ---
        let mean = stats.mean()?;
        let stddev = stats.sample_stddev()?;
        Some(Bounds {
            mean,
            stddev,
            upper: mean + k * stddev,
            lower: mean - k * stddev,
        })
    }

    pub fn excludes(&self, temperature: f64) -> bool {
        temperature > self.upper || temperature < self.lower
    }
}

/// Flag anomalous readings.
///
/// Output is grouped by sensor id (ascending) and ordered by timestamp
/// within each sensor. Sensors are scanned in parallel.
#[instrument(level = "debug", skip_all, fields(readings = readings.len(), k = config.k))]
pub fn detect_anomalies(readings: &[Reading], config: &AnomalyConfig) -> Vec<AnomalyRecord> {
    // ---
    let partitions: Vec<Vec<&Reading>> = partition_by_sensor(readings).into_values().collect();

    let flagged: Vec<AnomalyRecord> = partitions
        .par_iter()
        .map(|partition| scan_partition(partition, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    tracing::debug!(
        "Flagged {} of {} readings across {} sensors",
        flagged.len(),
        readings.len(),
        partitions.len()
    );
    flagged
}

/// Replay one sensor's time-ordered readings through the rolling window.
fn scan_partition(partition: &[&Reading], config: &AnomalyConfig) -> Vec<AnomalyRecord> {
    // ---
    let mut window = RollingWindow::new(config.window);
    let mut flagged = Vec::new();

    for reading in partition {
        let t = reading.temperature();
        let Some(bounds) = Bounds::from_stats(window.push(t), config.k) else {
            continue;
        };

        if bounds.excludes(t) {
            flagged.push(AnomalyRecord {
                timestamp: reading.timestamp(),
                sensor_id: reading.sensor_id().to_string(),
                temperature: t,
                rolling_mean: bounds.mean,
                rolling_stddev: bounds.stddev,
                upper_bound: bounds.upper,
                lower_bound: bounds.lower,
            });
        }
    }

    flagged
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(sensor: &str, temps: &[f64]) -> Vec<Reading> {
        // ---
        temps
            .iter()
            .enumerate()
            .map(|(i, &t)| Reading::new(t0() + Duration::minutes(i as i64 * 15), sensor, t).unwrap())
            .collect()
    }

    fn steady_then_spike() -> Vec<Reading> {
        // ---
        let mut temps = vec![22.0; 10];
        temps.push(50.0);
        series("S1", &temps)
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(detect_anomalies(&[], &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_spike_after_steady_run_is_flagged() {
        // ---
        let flagged = detect_anomalies(&steady_then_spike(), &AnomalyConfig::default());

        assert_eq!(flagged.len(), 1);
        let spike = &flagged[0];
        assert_eq!(spike.temperature, 50.0);
        assert!(spike.lower_bound < 22.0);
        assert!(22.0 < spike.upper_bound);
        assert!(spike.upper_bound < 50.0);
        assert!((spike.rolling_mean - (22.0 * 10.0 + 50.0) / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_reading_never_flagged() {
        // ---
        // Each sensor has a single reading, wildly apart from the others
        let readings = vec![
            series("A", &[-40.0]).remove(0),
            series("B", &[1000.0]).remove(0),
            series("C", &[0.0]).remove(0),
        ];
        assert!(detect_anomalies(&readings, &AnomalyConfig::default()).is_empty());

        // first reading of a longer series is also exempt
        let flagged = detect_anomalies(&series("S1", &[90.0, 20.0, 20.0]), &AnomalyConfig::default());
        assert!(flagged.iter().all(|a| a.timestamp != t0()));
    }

    #[test]
    fn test_equal_to_bound_is_not_anomalous() {
        // ---
        // zero spread: bounds collapse onto the mean, and equality is inside
        let flagged = detect_anomalies(&series("S1", &[5.0; 20]), &AnomalyConfig::default());
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_flagged_rows_satisfy_bound_condition() {
        // ---
        let temps = [
            20.0, 20.5, 19.8, 20.2, 27.0, 20.1, 19.9, 12.0, 20.3, 20.0, 35.0, 19.7,
        ];
        let config = AnomalyConfig::default();
        let flagged = detect_anomalies(&series("S1", &temps), &config);
        assert!(!flagged.is_empty());

        for a in &flagged {
            // recompute from the history up to and including this reading
            let idx = ((a.timestamp - t0()).num_minutes() / 15) as usize;
            let mut stats = RunningStats::new();
            temps[..=idx].iter().for_each(|&t| stats.push(t));
            let b = Bounds::from_stats(&stats, config.k()).unwrap();
            assert_eq!(b.upper, a.upper_bound);
            assert_eq!(b.lower, a.lower_bound);
            assert!(a.temperature > b.upper || a.temperature < b.lower);
        }
    }

    #[test]
    fn test_output_grouped_by_sensor_and_time_ordered() {
        // ---
        let mut s2 = vec![10.0; 7];
        s2.push(30.0);
        s2.extend([10.0; 10]);
        s2.push(90.0);
        let mut s1 = vec![5.0; 8];
        s1.push(-20.0);

        let mut readings = series("S2", &s2);
        readings.extend(series("S1", &s1));
        readings.reverse();

        let flagged = detect_anomalies(&readings, &AnomalyConfig::default());
        let ids: Vec<_> = flagged.iter().map(|a| a.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2", "S2"]);
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));

        let s2: Vec<_> = flagged.iter().filter(|a| a.sensor_id == "S2").collect();
        assert!(s2.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_duplicate_timestamps_do_not_crash() {
        // ---
        let mut temps = vec![21.0; 8];
        temps.push(60.0);
        let readings: Vec<Reading> = temps
            .iter()
            .map(|&t| Reading::new(t0(), "S1", t).unwrap())
            .collect();
        let flagged = detect_anomalies(&readings, &AnomalyConfig::default());
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].temperature, 60.0);
    }

    #[test]
    fn test_larger_k_flags_fewer() {
        // ---
        let temps = [20.0, 21.0, 19.0, 20.5, 24.0, 20.0, 19.5, 16.5, 20.0];
        let readings = series("S1", &temps);
        let loose = detect_anomalies(&readings, &AnomalyConfig::default());
        let strict = detect_anomalies(
            &readings,
            &AnomalyConfig::new(4.0, WindowPolicy::Cumulative).unwrap(),
        );
        assert!(strict.len() <= loose.len());
    }

    #[test]
    fn test_sliding_window_forgets_noisy_history() {
        // ---
        // A noisy start inflates the cumulative spread enough to hide a
        // later spike; a short sliding window only sees the quiet stretch.
        let mut temps = vec![15.0, 25.0, 15.0, 25.0, 15.0, 25.0, 15.0, 25.0];
        temps.extend([20.0; 8]);
        temps.push(22.0);
        let readings = series("S1", &temps);

        let cumulative = detect_anomalies(&readings, &AnomalyConfig::default());
        assert!(cumulative.is_empty());

        let sliding = detect_anomalies(
            &readings,
            &AnomalyConfig::new(DEFAULT_K, WindowPolicy::from_size(8)).unwrap(),
        );
        assert_eq!(sliding.len(), 1);
        assert_eq!(sliding[0].temperature, 22.0);
        assert!(sliding[0].rolling_stddev < 1.0);
    }

    #[test]
    fn test_sliding_window_constant_tail_not_flagged() {
        // ---
        let prefix = [0.1, 100.3, -50.7, 73.3, 1e3, -1e3, 0.3, 12.7];
        let mut temps = prefix.to_vec();
        temps.extend([20.1; 40]);
        let readings = series("S1", &temps);

        for size in 2..=8 {
            let config = AnomalyConfig::new(DEFAULT_K, WindowPolicy::from_size(size)).unwrap();
            // first reading whose whole window is the constant tail
            let settled = t0() + Duration::minutes(15 * (prefix.len() + size - 1) as i64);
            let late: Vec<_> = detect_anomalies(&readings, &config)
                .into_iter()
                .filter(|a| a.timestamp >= settled)
                .collect();
            assert!(late.is_empty(), "window {size} flagged {late:?}");
        }
    }

    #[test]
    fn test_rejects_unusable_coefficient() {
        // ---
        assert!(AnomalyConfig::new(0.0, WindowPolicy::Cumulative).is_err());
        assert!(AnomalyConfig::new(-1.0, WindowPolicy::Cumulative).is_err());
        assert!(AnomalyConfig::new(f64::NAN, WindowPolicy::Cumulative).is_err());
        assert!(AnomalyConfig::new(2.5, WindowPolicy::Cumulative).is_ok());
    }

    #[test]
    fn test_idempotent() {
        // ---
        let readings = steady_then_spike();
        let config = AnomalyConfig::default();
        assert_eq!(
            detect_anomalies(&readings, &config),
            detect_anomalies(&readings, &config)
        );
    }
}
