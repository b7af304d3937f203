//! Row types shared between the store, the feature layer, and run outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observation per (region, timestamp): six pollutant values, six climate
/// values, and the AQI target when known.
///
/// Values read from SQL NULL come back as `f64::NAN`; feature-row filtering
/// treats non-finite values as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Region identifier, the grouping key for all temporal features
    pub region_id: i64,
    /// Observation timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// PM2.5 concentration
    pub pm25: f64,
    /// PM10 concentration
    pub pm10: f64,
    /// Nitrogen dioxide concentration
    pub no2: f64,
    /// Sulfur dioxide concentration
    pub so2: f64,
    /// Carbon monoxide concentration
    pub co: f64,
    /// Ozone concentration
    pub o3: f64,
    /// Air temperature
    pub temperature: f64,
    /// Relative humidity
    pub humidity: f64,
    /// Wind speed
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Precipitation
    pub precipitation: f64,
    /// Atmospheric pressure
    pub pressure: f64,
    /// AQI target; `None` when not yet computed for this row
    pub aqi: Option<f64>,
}

/// Normalized pollutant values for one (region, timestamp), as written by the
/// transform step. Missing parameters stay `None` and persist as NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionRow {
    /// Region identifier
    pub region_id: i64,
    /// Observation timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// PM2.5 concentration
    pub pm25: Option<f64>,
    /// PM10 concentration
    pub pm10: Option<f64>,
    /// Nitrogen dioxide concentration
    pub no2: Option<f64>,
    /// Sulfur dioxide concentration
    pub so2: Option<f64>,
    /// Carbon monoxide concentration
    pub co: Option<f64>,
    /// Ozone concentration
    pub o3: Option<f64>,
    /// AQI; populated by a later labeling step, not by the transform
    pub aqi: Option<f64>,
}

/// Normalized climate values for one (region, timestamp), as written by the
/// transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRow {
    /// Region identifier
    pub region_id: i64,
    /// Observation timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Air temperature
    pub temperature: Option<f64>,
    /// Relative humidity
    pub humidity: Option<f64>,
    /// Wind speed
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_direction: Option<f64>,
    /// Precipitation
    pub precipitation: Option<f64>,
    /// Atmospheric pressure
    pub pressure: Option<f64>,
}

/// A raw source payload awaiting normalization.
#[derive(Debug, Clone)]
pub struct RawPayload {
    /// Row identifier in the ingest table
    pub id: i64,
    /// Name of the data source that produced the payload
    pub source: String,
    /// The payload exactly as fetched
    pub payload: serde_json::Value,
    /// When the payload was fetched (UTC)
    pub fetched_at: DateTime<Utc>,
}

/// One persisted prediction for an evaluation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Unique prediction identifier
    pub id: Uuid,
    /// Region the prediction is for
    pub region_id: i64,
    /// When the prediction was made (UTC)
    pub prediction_timestamp: DateTime<Utc>,
    /// The observation timestamp the prediction estimates
    pub target_timestamp: DateTime<Utc>,
    /// Predicted AQI value
    pub predicted_aqi: f64,
    /// Reserved column; the current pipeline never populates it
    pub confidence_score: Option<f64>,
    /// Version label of the model that produced this prediction
    pub model_version: String,
}

/// One persisted per-feature explanation row for a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    /// Unique explanation identifier
    pub id: Uuid,
    /// The prediction this explanation belongs to
    pub prediction_id: Uuid,
    /// Name of the feature column
    pub feature_name: String,
    /// The feature's observed value for the explained row
    pub feature_value: f64,
    /// Signed contribution to the deviation from the base value
    pub contribution: f64,
}

/// Metadata row recorded for each completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRunMeta {
    /// Version label for the trained model
    pub model_version: String,
    /// When training completed (UTC)
    pub trained_at: DateTime<Utc>,
    /// Root-mean-squared-error on the evaluation subset
    pub rmse: f64,
    /// Mean-absolute-error on the evaluation subset
    pub mae: f64,
    /// Where the serialized model artifact was written; empty when the run
    /// kept no artifact
    pub artifact_path: String,
}

/// A region with its stored observation count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Region identifier
    pub id: i64,
    /// Region name
    pub name: String,
    /// Number of pollution metric rows stored for the region
    pub metric_rows: u64,
}

/// Row counts across the store, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of regions
    pub regions: u64,
    /// Total raw payloads ingested
    pub raw_payloads: u64,
    /// Raw payloads not yet normalized
    pub unprocessed_payloads: u64,
    /// Rows in the pollution metrics table
    pub pollution_rows: u64,
    /// Rows in the climate metrics table
    pub climate_rows: u64,
    /// Persisted predictions
    pub predictions: u64,
    /// Persisted explanation rows
    pub explanations: u64,
}
