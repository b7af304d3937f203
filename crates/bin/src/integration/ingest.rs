//! OpenAQ ingest driver: discover locations for a country, fetch the latest
//! measurements per location, and stage the payloads unprocessed.

use indicatif::ProgressBar;
use plume_data::error::Result;
use plume_data::openaq::{LocationInfo, OpenAqClient};
use plume_data::store::DataStore;
use serde_json::Value;

/// Source name raw payloads are staged under.
const SOURCE_NAME: &str = "OpenAQ";

/// Knobs for one ingest sweep.
#[derive(Debug, Clone)]
pub(crate) struct IngestConfig {
    /// ISO 3166-1 alpha-2 country code to scan
    pub country: String,
    /// Locations page size
    pub page_size: u32,
    /// Maximum location pages to scan
    pub max_pages: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            country: "IN".to_string(),
            page_size: 100,
            max_pages: 2,
        }
    }
}

/// What one ingest sweep accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IngestSummary {
    /// Locations discovered across all pages
    pub locations: usize,
    /// Raw payloads staged in the store
    pub stored: usize,
    /// Latest-measurement fetches that failed after retries
    pub failed: usize,
}

/// The latest endpoint answers without the location display name, so the
/// staged payload carries the name alongside the measurement list for the
/// transform step to resolve.
fn wrap_payload(location: &LocationInfo, latest: Value) -> Value {
    let measurements = match latest {
        Value::Object(mut body) => body
            .remove("results")
            .filter(Value::is_array)
            .unwrap_or_else(|| Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };

    let mut wrapped = serde_json::Map::new();
    if let Some(name) = &location.name {
        wrapped.insert("location".to_string(), Value::String(name.clone()));
    }
    wrapped.insert("locationId".to_string(), Value::Number(location.id.into()));
    wrapped.insert("measurements".to_string(), measurements);
    Value::Object(wrapped)
}

/// Run one ingest sweep: page through locations, fetch latest measurements
/// sequentially, and stage everything in a single store write.
///
/// A failed latest fetch skips that location and counts it in the summary
/// rather than aborting the sweep.
pub(crate) async fn ingest_latest(
    client: &OpenAqClient,
    store: &dyn DataStore,
    config: &IngestConfig,
    progress: Option<&ProgressBar>,
) -> Result<IngestSummary> {
    let mut locations: Vec<LocationInfo> = Vec::new();
    for page in 1..=config.max_pages {
        let batch = client
            .locations_page(&config.country, config.page_size, page)
            .await?;
        if batch.is_empty() {
            break;
        }
        locations.extend(batch);
    }

    if let Some(pb) = progress {
        pb.set_length(locations.len() as u64);
        pb.set_message("Fetching latest measurements");
    }

    let mut summary = IngestSummary {
        locations: locations.len(),
        ..IngestSummary::default()
    };

    let mut payloads = Vec::with_capacity(locations.len());
    for location in &locations {
        match client.latest_for_location(location.id).await {
            Ok(latest) => payloads.push(wrap_payload(location, latest)),
            Err(e) => {
                summary.failed += 1;
                if let Some(pb) = progress {
                    pb.suspend(|| eprintln!("Warning: location {} skipped: {}", location.id, e));
                }
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    summary.stored = store.put_raw_payloads(SOURCE_NAME, &payloads)?;
    Ok(summary)
}
