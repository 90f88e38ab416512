//! Immutable in-memory reading store.
//!
//! Holds the validated reading set for the lifetime of the process and
//! hands out ordered per-sensor scans. Nothing mutates it after
//! construction, so the HTTP layer shares it behind an `Arc`.

use std::collections::BTreeMap;

use crate::error::IngestError;
use crate::models::{RawReading, Reading};

// ---

#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    readings: Vec<Reading>,
}

impl ReadingStore {
    // ---
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// Validate a raw batch. The first invalid record rejects the whole
    /// batch and is reported with its position.
    pub fn from_raw<I>(raw: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = RawReading>,
    {
        // ---
        let readings = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                Reading::try_from(r).map_err(|source| IngestError::InvalidInput { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Validated {} readings", readings.len());
        Ok(Self { readings })
    }

    /// Readings in input order.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct sensor ids, ascending.
    pub fn sensor_ids(&self) -> Vec<&str> {
        self.partitions().into_keys().collect()
    }

    /// Ordered scan by sensor and timestamp.
    pub fn partitions(&self) -> BTreeMap<&str, Vec<&Reading>> {
        partition_by_sensor(&self.readings)
    }
}

/// Group readings by sensor id, each group sorted by timestamp.
///
/// The sort is stable: readings sharing a timestamp keep their input order.
pub fn partition_by_sensor(readings: &[Reading]) -> BTreeMap<&str, Vec<&Reading>> {
    // ---
    let mut grouped: BTreeMap<&str, Vec<&Reading>> = BTreeMap::new();
    for reading in readings {
        grouped.entry(reading.sensor_id()).or_default().push(reading);
    }

    for partition in grouped.values_mut() {
        partition.sort_by_key(|r| r.timestamp());
    }

    grouped
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn reading(sensor: &str, hour: u32, temp: f64) -> Reading {
        // ---
        let ts = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Reading::new(ts, sensor, temp).unwrap()
    }

    fn raw(ts: &str, sensor: &str, temp: f64) -> RawReading {
        // ---
        RawReading {
            timestamp: Some(ts.to_string()),
            sensor_id: Some(sensor.to_string()),
            temperature: Some(temp),
        }
    }

    #[test]
    fn test_partitions_sorted_by_sensor_then_time() {
        // ---
        let store = ReadingStore::new(vec![
            reading("S2", 5, 1.0),
            reading("S1", 3, 2.0),
            reading("S2", 1, 3.0),
            reading("S1", 0, 4.0),
        ]);

        let parts = store.partitions();
        let keys: Vec<_> = parts.keys().copied().collect();
        assert_eq!(keys, vec!["S1", "S2"]);

        let s2: Vec<f64> = parts["S2"].iter().map(|r| r.temperature()).collect();
        assert_eq!(s2, vec![3.0, 1.0]);
    }

    #[test]
    fn test_duplicate_timestamps_keep_input_order() {
        // ---
        let store = ReadingStore::new(vec![
            reading("S1", 4, 10.0),
            reading("S1", 2, 20.0),
            reading("S1", 4, 30.0),
            reading("S1", 4, 40.0),
        ]);

        let temps: Vec<f64> = store.partitions()["S1"]
            .iter()
            .map(|r| r.temperature())
            .collect();
        assert_eq!(temps, vec![20.0, 10.0, 30.0, 40.0]);
    }

    #[test]
    fn test_from_raw_reports_index_of_first_bad_record() {
        // ---
        let batch = vec![
            raw("2025-06-01T00:00:00", "S1", 20.0),
            raw("2025-06-01T01:00:00", "S1", f64::NAN),
            raw("not a time", "S1", 20.0),
        ];

        match ReadingStore::from_raw(batch) {
            Err(IngestError::InvalidInput { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_from_raw_accepts_valid_batch() {
        // ---
        let store = ReadingStore::from_raw(vec![
            raw("2025-06-01T00:00:00", "S1", 20.0),
            raw("2025-06-01T01:00:00", "S2", 21.0),
        ])
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.sensor_ids(), vec!["S1", "S2"]);
    }

    #[test]
    fn test_empty_store() {
        // ---
        let store = ReadingStore::default();
        assert!(store.is_empty());
        assert!(store.partitions().is_empty());
    }
}
