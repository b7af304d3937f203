//! Persistence layer for observations, predictions, and explanations.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{
    AttributionRecord, ClimateRow, MetricRecord, ModelRunMeta, PollutionRow, PredictionRecord,
    RawPayload, RegionSummary, StoreStats,
};

/// The single persistence interface the pipeline and its collaborators see.
///
/// Exactly one implementation is selected when the process starts; nothing
/// downstream branches on which implementation is active. All methods block
/// the calling thread until the store has acknowledged the operation.
pub trait DataStore {
    /// Load the training stream: pollution and climate metrics joined on
    /// (region, timestamp), restricted to rows with a known AQI, ordered by
    /// region then timestamp, optionally capped at `max_rows`.
    fn training_records(&self, max_rows: Option<usize>) -> Result<Vec<MetricRecord>>;

    /// Get or create the region with the given name, returning its id.
    fn upsert_region(&self, name: &str) -> Result<i64>;

    /// Look up a region id by name, case-insensitively.
    fn region_id_by_name(&self, name: &str) -> Result<Option<i64>>;

    /// Get or create a data source row, returning its id.
    fn upsert_source(&self, name: &str) -> Result<i64>;

    /// Store fetched payloads verbatim under the named source, unprocessed.
    /// Returns the number of rows written. All rows land in one transaction.
    fn put_raw_payloads(&self, source: &str, payloads: &[serde_json::Value]) -> Result<usize>;

    /// Fetch up to `limit` payloads that have not yet been normalized, oldest
    /// first.
    fn unprocessed_payloads(&self, limit: usize) -> Result<Vec<RawPayload>>;

    /// Mark the given raw payload rows as processed.
    fn mark_payloads_processed(&self, ids: &[i64]) -> Result<()>;

    /// Write normalized metric rows produced by the transform step, in one
    /// transaction.
    fn put_metric_rows(&self, pollution: &[PollutionRow], climate: &[ClimateRow]) -> Result<()>;

    /// Persist one run's predictions and explanations atomically: either
    /// every record becomes visible or none do.
    fn put_run(
        &self,
        predictions: &[PredictionRecord],
        attributions: &[AttributionRecord],
    ) -> Result<()>;

    /// Record metadata for a completed training run.
    fn put_model_run(&self, run: &ModelRunMeta) -> Result<()>;

    /// List all regions with their stored observation counts, by name.
    fn region_summaries(&self) -> Result<Vec<RegionSummary>>;

    /// Row counts across the store.
    fn stats(&self) -> Result<StoreStats>;
}
