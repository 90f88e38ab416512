//! `codemetal-sensorstats`: statistical aggregation over temperature
//! sensor readings.
//!
//! # Module structure
//!
//! ```text
//! codemetal_sensorstats
//! ├── models    — RawReading / Reading and the three result row types
//! ├── error     — ingestion error types
//! ├── stats     — Welford running statistics and window policies
//! ├── store     — immutable reading store with ordered per-sensor scans
//! ├── aggregate
//! │   ├── trend   — mean temperature per sensor
//! │   ├── anomaly — rolling mean/stddev outlier detection
//! │   └── diurnal — mean temperature per hour of day
//! ├── ingest    — JSON file and paginated HTTP feed loaders
//! ├── synthetic — seeded demo dataset generator
//! ├── export    — NDJSON / TSV row export
//! ├── config    — environment configuration
//! └── routes    — axum presentation endpoints
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod stats;
pub mod store;
pub mod synthetic;

pub use config::{Config, ReadingSource};
pub use error::{IngestError, InvalidInputError};
pub use models::{AnomalyRecord, DiurnalResult, RawReading, Reading, TrendResult};
pub use store::ReadingStore;
