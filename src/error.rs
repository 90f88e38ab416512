//! Error types for reading ingestion.
//!
//! Aggregators themselves are infallible on a validated reading set, so
//! every failure the engine can report originates here, before any
//! statistic is computed.

use thiserror::Error;

/// Why a single record was refused at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("reading has no timestamp")]
    MissingTimestamp,

    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("reading has no sensor id")]
    MissingSensorId,

    #[error("reading has no temperature")]
    MissingTemperature,

    #[error("temperature {0} is not finite")]
    NonFiniteTemperature(f64),
}

/// Failure while loading a reading set from an external source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed reading payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sensor feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid reading at index {index}: {source}")]
    InvalidInput {
        index: usize,
        #[source]
        source: InvalidInputError,
    },

    #[error("invalid generator settings: {0}")]
    Settings(String),
}

/// Anomaly coefficient outside the usable range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("anomaly coefficient must be finite and greater than zero, got {0}")]
pub struct InvalidCoefficient(pub f64);
