//! OpenAQ data ingestion.
//!
//! This module covers the journey from the OpenAQ v3 API into the store:
//! - Paginated location discovery for a country
//! - Latest-measurement retrieval per location, returned untyped for the
//!   caller to stage as raw payloads
//! - Pure payload normalization (parameter synonym tables, location-name
//!   canonicalization) used by the transform step
//!
//! # Example
//!
//! ```no_run
//! use plume_data::openaq::OpenAqClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAqClient::new("my-api-key")?;
//!     let locations = client.locations_page("IN", 100, 1).await?;
//!     for loc in &locations {
//!         let payload = client.latest_for_location(loc.id).await?;
//!         println!("{}: {} bytes", loc.id, payload.to_string().len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod payload;

// Re-export main types
pub use client::{LocationInfo, OpenAqClient, RetryPolicy};
pub use payload::{
    CLIMATE_PARAMS, ExtractedValues, POLLUTANT_PARAMS, canonical_climate, canonical_pollutant,
    extract_location_name, extract_measurements, normalize_location_name,
};
