//! Row-oriented export of the result tables.
//!
//! Two flat formats: newline-delimited JSON (one object per row) and
//! tab-separated values with a header line. Both keep a fixed column set
//! per table.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::{AnomalyRecord, DiurnalResult, TrendResult};

// ---

/// Timestamp layout used in text exports (millisecond precision).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A result row with a fixed column layout.
pub trait TabularRow: Serialize {
    fn columns() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

impl TabularRow for TrendResult {
    fn columns() -> &'static [&'static str] {
        &["sensor_id", "mean_temperature", "reading_count"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.sensor_id.clone(),
            self.mean_temperature.to_string(),
            self.reading_count.to_string(),
        ]
    }
}

impl TabularRow for AnomalyRecord {
    fn columns() -> &'static [&'static str] {
        &[
            "timestamp",
            "sensor_id",
            "temperature",
            "rolling_mean",
            "rolling_stddev",
            "upper_bound",
            "lower_bound",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.sensor_id.clone(),
            self.temperature.to_string(),
            self.rolling_mean.to_string(),
            self.rolling_stddev.to_string(),
            self.upper_bound.to_string(),
            self.lower_bound.to_string(),
        ]
    }
}

impl TabularRow for DiurnalResult {
    fn columns() -> &'static [&'static str] {
        &["hour", "mean_temperature", "reading_count"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.hour.to_string(),
            self.mean_temperature.to_string(),
            self.reading_count.to_string(),
        ]
    }
}

/// Write one JSON object per line.
pub fn write_json_lines<T, W>(rows: &[T], mut out: W) -> io::Result<()>
where
    T: Serialize,
    W: Write,
{
    // ---
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Write a header line followed by one tab-separated line per row.
///
/// Tabs and newlines inside a field are replaced by spaces so a sensor id
/// can never break the column layout.
pub fn write_tsv<T, W>(rows: &[T], mut out: W) -> io::Result<()>
where
    T: TabularRow,
    W: Write,
{
    // ---
    writeln!(out, "{}", T::columns().join("\t"))?;
    for row in rows {
        let line: Vec<String> = row
            .fields()
            .into_iter()
            .map(|f| f.replace(['\t', '\n', '\r'], " "))
            .collect();
        writeln!(out, "{}", line.join("\t"))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn trend_rows() -> Vec<TrendResult> {
        vec![
            TrendResult {
                sensor_id: "S1".to_string(),
                mean_temperature: 21.5,
                reading_count: 4,
            },
            TrendResult {
                sensor_id: "S\t2".to_string(),
                mean_temperature: 19.0,
                reading_count: 2,
            },
        ]
    }

    #[test]
    fn test_tsv_has_header_and_fixed_columns() {
        // ---
        let mut buf = Vec::new();
        write_tsv(&trend_rows(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "sensor_id\tmean_temperature\treading_count");
        assert_eq!(lines[1], "S1\t21.5\t4");
        assert_eq!(lines[2], "S 2\t19\t2");
        assert!(lines.iter().all(|l| l.split('\t').count() == 3));
    }

    #[test]
    fn test_json_lines_one_object_per_row() {
        // ---
        let rows = vec![DiurnalResult {
            hour: 7,
            mean_temperature: 18.25,
            reading_count: 12,
        }];
        let mut buf = Vec::new();
        write_json_lines(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "{\"hour\":7,\"mean_temperature\":18.25,\"reading_count\":12}\n"
        );
    }

    #[test]
    fn test_anomaly_timestamp_keeps_milliseconds() {
        // ---
        let ts = NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_milli_opt(18, 45, 0, 250)
            .unwrap();
        let row = AnomalyRecord {
            timestamp: ts,
            sensor_id: "S1".to_string(),
            temperature: 50.0,
            rolling_mean: 24.5,
            rolling_stddev: 8.4,
            upper_bound: 41.3,
            lower_bound: 7.7,
        };
        assert_eq!(row.fields()[0], "2025-03-26T18:45:00.250");
        assert_eq!(row.fields().len(), AnomalyRecord::columns().len());
    }

    #[test]
    fn test_empty_table_exports_header_only() {
        // ---
        let mut buf = Vec::new();
        write_tsv::<DiurnalResult, _>(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "hour\tmean_temperature\treading_count\n");
    }
}
