//! Arena of records indexed by (region, time-order position).

use crate::schema;
use plume_data::MetricRecord;

/// One region's contiguous run inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionGroup {
    /// Region identifier shared by every record in the run
    pub region_id: i64,
    /// Offset of the run's first record in the arena
    pub start: usize,
    /// Number of records in the run
    pub len: usize,
}

/// Records regrouped into contiguous per-region runs over one shared slice.
///
/// Positions are 0-based within a run; lag and rolling lookups are integer
/// offsets that never cross a region boundary. Callers must supply records
/// already grouped by region and sorted ascending by timestamp; the arena
/// detects run boundaries but does not re-sort.
#[derive(Debug)]
pub struct RegionArena<'a> {
    records: &'a [MetricRecord],
    groups: Vec<RegionGroup>,
}

impl<'a> RegionArena<'a> {
    /// Index a record slice into per-region runs.
    pub fn new(records: &'a [MetricRecord]) -> Self {
        let mut groups = Vec::new();
        let mut start = 0;
        for (i, record) in records.iter().enumerate() {
            if record.region_id != records[start].region_id {
                groups.push(RegionGroup {
                    region_id: records[start].region_id,
                    start,
                    len: i - start,
                });
                start = i;
            }
        }
        if !records.is_empty() {
            groups.push(RegionGroup {
                region_id: records[start].region_id,
                start,
                len: records.len() - start,
            });
        }
        Self { records, groups }
    }

    /// All records, in arena order.
    pub fn records(&self) -> &[MetricRecord] {
        self.records
    }

    /// Per-region runs, in arena order.
    pub fn groups(&self) -> &[RegionGroup] {
        &self.groups
    }

    /// Total record count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the arena holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at a (run, position) address.
    pub fn record(&self, group: RegionGroup, pos: usize) -> &MetricRecord {
        debug_assert!(pos < group.len);
        &self.records[group.start + pos]
    }

    /// The history column value exactly `lag` records earlier in the same
    /// run, or `None` when the run has fewer than `lag` records before
    /// `pos`.
    pub fn lagged(
        &self,
        group: RegionGroup,
        pos: usize,
        column_idx: usize,
        lag: usize,
    ) -> Option<f64> {
        if pos < lag {
            return None;
        }
        Some(schema::history_value(self.record(group, pos - lag), column_idx))
    }

    /// Mean of the history column over the trailing window ending at `pos`,
    /// computed over the finite values present (a short leading window is
    /// averaged over whatever history exists). NaN when every value in the
    /// window is missing or the window size is zero.
    pub fn trailing_mean(
        &self,
        group: RegionGroup,
        pos: usize,
        column_idx: usize,
        window: usize,
    ) -> f64 {
        if window == 0 {
            return f64::NAN;
        }
        let from = pos.saturating_sub(window - 1);
        let mut sum = 0.0;
        let mut count = 0usize;
        for p in from..=pos {
            let value = schema::history_value(self.record(group, p), column_idx);
            if value.is_finite() {
                sum += value;
                count += 1;
            }
        }
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }
}
