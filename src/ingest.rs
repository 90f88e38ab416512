//! Reading ingestion from files and the upstream sensor feed.
//!
//! Both paths end in [`ReadingStore::from_raw`], so every record is
//! validated before any aggregator sees it.

use std::path::Path;

use crate::error::IngestError;
use crate::models::RawReading;
use crate::store::ReadingStore;

// ---

/// Load a JSON array of readings from disk.
pub fn load_json_file(path: impl AsRef<Path>) -> Result<ReadingStore, IngestError> {
    // ---
    let path = path.as_ref();
    let body = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let store = parse_json(&body)?;
    tracing::info!("Loaded {} readings from {}", store.len(), path.display());
    Ok(store)
}

/// Parse a JSON array of raw readings.
pub fn parse_json(body: &str) -> Result<ReadingStore, IngestError> {
    // ---
    let raw: Vec<RawReading> = serde_json::from_str(body)?;
    ReadingStore::from_raw(raw)
}

/// Fetch cursor-paginated readings from the sensor feed.
///
/// Each page looks like `{"results": [...], "next_cursor": "..."}`. Items
/// that do not deserialize are skipped; items that deserialize but fail
/// validation reject the whole fetch.
pub async fn fetch_readings(base_url: &str, max_pages: u32) -> Result<ReadingStore, IngestError> {
    // ---
    let client = reqwest::Client::new();
    let mut all_data: Vec<RawReading> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        if page_count >= max_pages {
            tracing::debug!(
                "Hit page limit of {}, stopping pagination. Fetched {} records so far.",
                max_pages,
                all_data.len()
            );
            break;
        }
        page_count += 1;

        let mut request = client.get(base_url);
        if let Some(ref cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        tracing::debug!("Fetching page {} from: {}", page_count, base_url);

        let response: serde_json::Value = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.get("results").and_then(|d| d.as_array()) {
            Some(data) => {
                tracing::debug!("Page {} has {} items", page_count, data.len());
                for (i, item) in data.iter().enumerate() {
                    match serde_json::from_value::<RawReading>(item.clone()) {
                        Ok(reading) => all_data.push(reading),
                        Err(e) => tracing::debug!(
                            "Skipping item {} on page {}: {} - Raw item: {}",
                            i,
                            page_count,
                            e,
                            item
                        ),
                    }
                }
            }
            None => tracing::warn!(
                "Page {} response missing 'results' field or not an array",
                page_count
            ),
        }

        cursor = response
            .get("next_cursor")
            .and_then(|c| c.as_str())
            .map(String::from);

        if cursor.is_none() {
            break;
        }
    }

    tracing::info!(
        "Finished fetching {} total records from {} pages",
        all_data.len(),
        page_count
    );
    ReadingStore::from_raw(all_data)
}
