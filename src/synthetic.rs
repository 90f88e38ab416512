//! Deterministic synthetic reading generator.
//!
//! Produces a realistic-looking dataset when no file or feed is configured:
//! every sensor follows a daily sine cycle around its own base temperature,
//! with uniform noise and rare injected spikes for the anomaly detector to
//! find. The same seed always yields the same readings.

use std::f64::consts::TAU;

use chrono::{DateTime, Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::IngestError;
use crate::models::Reading;
use crate::store::ReadingStore;

// ---

/// Days between the Unix epoch and 2025-01-01.
const DEFAULT_START_DAYS: i64 = 20_089;

/// Upper bound on the total number of generated readings.
pub const MAX_READINGS: u64 = 50_000_000;

/// Hour of day at which the synthetic cycle peaks.
const PEAK_HOUR: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sensors: u32,
    pub days: u32,
    pub interval_minutes: u32,
    pub start: NaiveDateTime,
    pub base_temp: f64,
    pub diurnal_amplitude: f64,
    pub noise_amplitude: f64,
    pub spike_probability: f64,
    pub spike_magnitude: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sensors: 5,
            days: 7,
            interval_minutes: 15,
            start: DateTime::UNIX_EPOCH.naive_utc() + Duration::days(DEFAULT_START_DAYS),
            base_temp: 22.0,
            diurnal_amplitude: 3.0,
            noise_amplitude: 0.5,
            spike_probability: 0.002,
            spike_magnitude: 12.0,
            seed: 42,
        }
    }
}

/// Generate a reading store from `config`.
///
/// Readings are emitted sensor by sensor in time order. Invalid settings
/// (such as a NaN base temperature) surface as ingestion errors rather than
/// poisoning the store.
pub fn generate(config: &SyntheticConfig) -> Result<ReadingStore, IngestError> {
    // ---
    let mut rng = StdRng::seed_from_u64(config.seed);
    let interval = u64::from(config.interval_minutes.max(1));
    let samples_per_sensor = u64::from(config.days) * 24 * 60 / interval;
    let total = u64::from(config.sensors) * samples_per_sensor;
    if total > MAX_READINGS {
        return Err(IngestError::Settings(format!(
            "{} sensors over {} days at {} minute intervals is {} readings, limit is {}",
            config.sensors, config.days, interval, total, MAX_READINGS
        )));
    }
    let spike_probability = if config.spike_probability.is_nan() {
        0.0
    } else {
        config.spike_probability.clamp(0.0, 1.0)
    };
    let mut readings = Vec::with_capacity(total as usize);

    for s in 0..config.sensors {
        let sensor_id = format!("sensor-{:02}", s + 1);
        let offset: f64 = rng.gen_range(-1.5..=1.5);

        for i in 0..samples_per_sensor {
            let timestamp = i64::try_from(i * interval)
                .ok()
                .and_then(Duration::try_minutes)
                .and_then(|offset| config.start.checked_add_signed(offset))
                .ok_or_else(|| {
                    IngestError::Settings(format!(
                        "sample {} of {} falls outside the representable time range",
                        i, sensor_id
                    ))
                })?;
            let hour = f64::from(timestamp.hour()) + f64::from(timestamp.minute()) / 60.0;
            let cycle = config.diurnal_amplitude * (TAU * (hour - PEAK_HOUR + 6.0) / 24.0).sin();
            let noise = if config.noise_amplitude > 0.0 {
                rng.gen_range(-config.noise_amplitude..=config.noise_amplitude)
            } else {
                0.0
            };
            let spike = if rng.gen_bool(spike_probability) {
                if rng.gen_bool(0.5) {
                    config.spike_magnitude
                } else {
                    -config.spike_magnitude
                }
            } else {
                0.0
            };

            let temperature = config.base_temp + offset + cycle + noise + spike;
            let reading = Reading::new(timestamp, sensor_id.as_str(), temperature).map_err(
                |source| IngestError::InvalidInput {
                    index: readings.len(),
                    source,
                },
            )?;
            readings.push(reading);
        }
    }

    tracing::info!(
        "Generated {} synthetic readings for {} sensors over {} days",
        readings.len(),
        config.sensors,
        config.days
    );
    Ok(ReadingStore::new(readings))
}
