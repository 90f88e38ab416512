//! Data models for the sensor statistics engine.
//!
//! `RawReading` is the wire shape accepted at ingestion, `Reading` the
//! validated record every aggregator consumes. The three result row types
//! are derived, read-only tables handed to the presentation layer.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

// ---

/// Naive timestamp layouts accepted when the input carries no offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Un-validated sensor record as it arrives from a file or feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    // ---
    pub timestamp: Option<String>,
    #[serde(alias = "device_id")]
    pub sensor_id: Option<String>,
    #[serde(alias = "temperature_c")]
    pub temperature: Option<f64>,
}

/// Validated temperature observation.
///
/// Fields are private so the only way to obtain a `Reading` is through
/// validation; downstream code can rely on a finite temperature and a
/// non-empty sensor id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    timestamp: NaiveDateTime,
    sensor_id: String,
    temperature: f64,
}

impl Reading {
    // ---
    pub fn new(
        timestamp: NaiveDateTime,
        sensor_id: impl Into<String>,
        temperature: f64,
    ) -> Result<Self, InvalidInputError> {
        // ---
        let sensor_id = sensor_id.into();
        if sensor_id.trim().is_empty() {
            return Err(InvalidInputError::MissingSensorId);
        }
        if !temperature.is_finite() {
            return Err(InvalidInputError::NonFiniteTemperature(temperature));
        }

        Ok(Reading {
            timestamp,
            sensor_id,
            temperature,
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl TryFrom<RawReading> for Reading {
    type Error = InvalidInputError;

    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        // ---
        let timestamp = raw
            .timestamp
            .as_deref()
            .ok_or(InvalidInputError::MissingTimestamp)
            .and_then(parse_timestamp)?;
        let sensor_id = raw.sensor_id.ok_or(InvalidInputError::MissingSensorId)?;
        let temperature = raw
            .temperature
            .ok_or(InvalidInputError::MissingTemperature)?;

        Reading::new(timestamp, sensor_id, temperature)
    }
}

/// Parse a reading timestamp into its wall-clock value.
///
/// RFC 3339 input keeps the local time of its own offset; it is not
/// shifted to UTC, so hour-of-day reflects what the sensor reported.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, InvalidInputError> {
    // ---
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| InvalidInputError::BadTimestamp(s.to_string()))
}

/// Mean temperature of one sensor over the whole observation window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub sensor_id: String,
    pub mean_temperature: f64,
    pub reading_count: usize,
}

/// A reading that fell outside `k` rolling standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    // ---
    pub timestamp: NaiveDateTime,
    pub sensor_id: String,
    pub temperature: f64,
    pub rolling_mean: f64,
    pub rolling_stddev: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

/// Mean temperature for one hour of the day, across all sensors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiurnalResult {
    pub hour: u32,
    pub mean_temperature: f64,
    pub reading_count: usize,
}
