//! Transform driver: normalize staged raw payloads into metric rows.
//!
//! Each batch resolves payload locations to region ids, extracts mapped
//! measurements, and commits rows plus the processed flags together. Rows
//! whose region cannot be resolved are discarded by default; `keep_unmapped`
//! leaves them staged for a later sweep instead.

use plume::regions::RegionRegistry;
use plume_data::error::Result;
use plume_data::openaq::{extract_location_name, extract_measurements};
use plume_data::store::DataStore;
use std::collections::HashSet;

/// Knobs for one transform sweep.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransformConfig {
    /// Raw rows fetched per batch
    pub batch_size: usize,
    /// Leave rows whose region cannot be resolved unprocessed instead of
    /// discarding them
    pub keep_unmapped: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            keep_unmapped: false,
        }
    }
}

/// What one transform sweep accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TransformSummary {
    /// Raw rows marked processed
    pub processed: usize,
    /// Pollution rows written
    pub pollution_rows: usize,
    /// Climate rows written
    pub climate_rows: usize,
    /// Rows discarded because their region could not be resolved
    pub unmapped: usize,
    /// Rows left staged under `keep_unmapped`
    pub left_unprocessed: usize,
}

/// Region id for a payload location name.
///
/// Registry names are created in the store on first sight under their
/// canonical spelling; any other name must already exist as a region row.
fn resolve_region(
    store: &dyn DataStore,
    registry: &RegionRegistry,
    name: &str,
) -> Result<Option<i64>> {
    if let Some(canonical) = registry.canonical_name(name) {
        return store.upsert_region(canonical).map(Some);
    }
    store.region_id_by_name(name)
}

/// Drain the staged payload queue in batches.
///
/// The sweep stops when the queue is empty, or when a whole batch was kept
/// back unprocessed and another fetch would return the same rows.
pub(crate) fn transform_unprocessed(
    store: &dyn DataStore,
    registry: &RegionRegistry,
    config: &TransformConfig,
) -> Result<TransformSummary> {
    let mut summary = TransformSummary::default();
    let mut kept: HashSet<i64> = HashSet::new();

    loop {
        let batch = store.unprocessed_payloads(config.batch_size)?;
        if batch.is_empty() {
            break;
        }

        let mut pollution = Vec::new();
        let mut climate = Vec::new();
        let mut done_ids = Vec::new();

        for raw in &batch {
            let region_id = match extract_location_name(&raw.payload) {
                Some(name) => resolve_region(store, registry, &name)?,
                None => None,
            };

            let Some(region_id) = region_id else {
                if config.keep_unmapped {
                    kept.insert(raw.id);
                } else {
                    summary.unmapped += 1;
                    done_ids.push(raw.id);
                }
                continue;
            };

            let extracted = extract_measurements(&raw.payload);
            let (pollution_row, climate_row) = extracted.into_rows(region_id, raw.fetched_at);
            if let Some(row) = pollution_row {
                pollution.push(row);
            }
            if let Some(row) = climate_row {
                climate.push(row);
            }
            done_ids.push(raw.id);
        }

        if done_ids.is_empty() {
            break;
        }

        if !pollution.is_empty() || !climate.is_empty() {
            store.put_metric_rows(&pollution, &climate)?;
        }
        store.mark_payloads_processed(&done_ids)?;

        summary.processed += done_ids.len();
        summary.pollution_rows += pollution.len();
        summary.climate_rows += climate.len();
    }

    summary.left_unprocessed = kept.len();
    Ok(summary)
}
