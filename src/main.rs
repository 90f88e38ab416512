//! Application entry point for the `codemetal-sensorstats` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading `.env` into the process environment
//! - Initializing structured logging/tracing
//! - Loading configuration from environment variables
//! - Loading and validating the reading set (file, feed, or synthetic)
//! - Mounting the result-table routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `READINGS_FILE` / `SENSOR_API_URL` (optional) – reading source
//! - `ANOMALY_K` / `ANOMALY_WINDOW` (optional) – anomaly policy
//! - `BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the full list.
use std::{env, io::IsTerminal, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use codemetal_sensorstats::{
    config, ingest, routes,
    synthetic::{self, SyntheticConfig},
    ReadingSource, ReadingStore,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    // .env must be loaded before the subscriber reads AXUM_LOG_LEVEL
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = load_store(&cfg.source).await?;
    tracing::info!(
        "Serving {} readings from {} sensors",
        store.len(),
        store.sensor_ids().len()
    );

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(Arc::new(store), cfg.anomaly);

    tracing::info!("Listening on {}", cfg.bind_addr);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Load and validate the reading set from the configured source.
async fn load_store(source: &ReadingSource) -> Result<ReadingStore> {
    // ---
    let store = match source {
        ReadingSource::File(path) => ingest::load_json_file(path)
            .with_context(|| format!("Failed to load readings from {}", path.display()))?,
        ReadingSource::Api { url, max_pages } => ingest::fetch_readings(url, *max_pages)
            .await
            .context("Failed to fetch readings from sensor feed")?,
        ReadingSource::Synthetic {
            sensors,
            days,
            seed,
        } => synthetic::generate(&SyntheticConfig {
            sensors: *sensors,
            days: *days,
            seed: *seed,
            ..SyntheticConfig::default()
        })
        .context("Failed to generate synthetic readings")?,
    };

    Ok(store)
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, falling back to `AXUM_LOG_LEVEL`
///
/// Call once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
