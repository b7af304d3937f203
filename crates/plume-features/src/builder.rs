//! Feature construction from the raw observation stream.

use crate::arena::RegionArena;
use crate::error::{FeatureError, Result};
use crate::matrix::{FeatureMatrix, RowKey};
use crate::schema;
use chrono::{Datelike, Timelike};
use ndarray::{Array1, Array2};
use plume_data::MetricRecord;

/// Configuration for feature construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Lag depths, in records, applied to every history column
    pub lags: Vec<usize>,
    /// Trailing window sizes, in records, applied to every history column
    pub windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 3, 6],
            windows: vec![3, 6],
        }
    }
}

/// Builds the feature matrix from an ordered observation stream.
///
/// Input must be grouped by region and sorted ascending by timestamp within
/// each region. Ordering is a precondition: the training query returns rows
/// that way, and it is not re-verified here.
///
/// # Example
///
/// ```no_run
/// use plume_features::{FeatureBuilder, FeatureConfig};
///
/// # fn example(records: &[plume_data::MetricRecord]) -> plume_features::Result<()> {
/// let builder = FeatureBuilder::new(FeatureConfig::default())?;
/// let matrix = builder.build(records)?;
/// println!("{} rows x {} features", matrix.n_rows(), matrix.n_features());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a builder, rejecting zero lag depths and zero window sizes.
    pub fn new(config: FeatureConfig) -> Result<Self> {
        if config.lags.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "lag depths must be at least 1".to_string(),
            ));
        }
        if config.windows.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "window sizes must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// The ordered feature column names this builder produces.
    pub fn feature_names(&self) -> Vec<String> {
        schema::feature_columns(&self.config.lags, &self.config.windows)
    }

    /// Build the feature matrix and aligned target vector.
    ///
    /// A row survives only if every feature column and the target are
    /// present: rows early in a region's history lack deep lags and drop
    /// out, as do rows whose source values were missing. The result is
    /// deterministic for a given input.
    pub fn build(&self, records: &[MetricRecord]) -> Result<FeatureMatrix> {
        if records.is_empty() {
            return Err(FeatureError::EmptyInput);
        }

        let names = self.feature_names();
        let n_features = names.len();
        let arena = RegionArena::new(records);

        let mut rows: Vec<f64> = Vec::new();
        let mut targets: Vec<f64> = Vec::new();
        let mut keys: Vec<RowKey> = Vec::new();
        let mut values: Vec<f64> = Vec::with_capacity(n_features);

        for &group in arena.groups() {
            for pos in 0..group.len {
                let record = arena.record(group, pos);
                let target = record.aqi.unwrap_or(f64::NAN);
                values.clear();

                for idx in 0..schema::BASE_COLUMNS.len() {
                    values.push(schema::history_value(record, idx));
                }

                let ts = record.timestamp;
                values.push(f64::from(ts.hour()));
                values.push(f64::from(ts.weekday().num_days_from_monday()));
                values.push(f64::from(ts.month()));

                for lag in &self.config.lags {
                    for idx in 0..schema::HISTORY_COLUMNS.len() {
                        values.push(arena.lagged(group, pos, idx, *lag).unwrap_or(f64::NAN));
                    }
                }
                for window in &self.config.windows {
                    for idx in 0..schema::HISTORY_COLUMNS.len() {
                        values.push(arena.trailing_mean(group, pos, idx, *window));
                    }
                }

                if target.is_finite() && values.iter().all(|v| v.is_finite()) {
                    rows.extend_from_slice(&values);
                    targets.push(target);
                    keys.push(RowKey {
                        region_id: record.region_id,
                        timestamp: ts,
                    });
                }
            }
        }

        if keys.is_empty() {
            return Err(FeatureError::InsufficientHistory {
                input_rows: records.len(),
            });
        }

        let n_rows = keys.len();
        let features = Array2::from_shape_vec((n_rows, n_features), rows)
            .map_err(|e| FeatureError::InvalidShape(e.to_string()))?;
        FeatureMatrix::new(names, features, Array1::from_vec(targets), keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record(region_id: i64, hour: u32, pm25: f64, aqi: Option<f64>) -> MetricRecord {
        MetricRecord {
            region_id,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap(),
            pm25,
            pm10: 40.0,
            no2: 20.0,
            so2: 5.0,
            co: 0.4,
            o3: 30.0,
            temperature: 25.0,
            humidity: 60.0,
            wind_speed: 3.0,
            wind_direction: 180.0,
            precipitation: 0.0,
            pressure: 1012.0,
            aqi,
        }
    }

    fn seven_hourly_records() -> Vec<MetricRecord> {
        [10.0, 12.0, 11.0, 13.0, 15.0, 14.0, 16.0]
            .iter()
            .enumerate()
            .map(|(h, pm)| record(1, h as u32, *pm, Some(100.0 + h as f64)))
            .collect()
    }

    fn feature(matrix: &FeatureMatrix, row: usize, name: &str) -> f64 {
        let idx = matrix
            .feature_names()
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("no column {name}"));
        matrix.row(row)[idx]
    }

    #[test]
    fn test_seven_record_region_leaves_one_row() {
        let builder = FeatureBuilder::new(FeatureConfig::default()).unwrap();
        let matrix = builder.build(&seven_hourly_records()).unwrap();

        // positions 0..=5 lack a lag-6 value and drop out
        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.n_features(), 80);

        assert_eq!(feature(&matrix, 0, "pm25"), 16.0);
        assert_eq!(feature(&matrix, 0, "pm25_lag_1"), 14.0);
        assert_eq!(feature(&matrix, 0, "pm25_lag_3"), 11.0);
        assert_eq!(feature(&matrix, 0, "pm25_lag_6"), 10.0);
        assert_eq!(feature(&matrix, 0, "pm25_roll_3"), 15.0);

        // the surviving row keeps its original identity and target
        assert_eq!(matrix.keys()[0].region_id, 1);
        assert_eq!(
            matrix.keys()[0].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap()
        );
        assert_eq!(matrix.targets()[0], 106.0);
    }

    #[test]
    fn test_temporal_features() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();
        let matrix = builder.build(&seven_hourly_records()).unwrap();

        // 2024-03-10 is a Sunday
        assert_eq!(feature(&matrix, 0, "hour"), 1.0);
        assert_eq!(feature(&matrix, 0, "day_of_week"), 6.0);
        assert_eq!(feature(&matrix, 0, "month"), 3.0);
    }

    #[test]
    fn test_rolling_mean_uses_available_history() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();
        let matrix = builder.build(&seven_hourly_records()).unwrap();

        // first surviving row is position 1; its window holds 2 records
        assert_eq!(matrix.n_rows(), 6);
        assert_eq!(feature(&matrix, 0, "pm25_roll_3"), 11.0);
        // position 3 has a full window: mean(12, 11, 13)
        assert_eq!(feature(&matrix, 2, "pm25_roll_3"), 12.0);
    }

    #[test]
    fn test_aqi_history_is_a_feature() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();
        let matrix = builder.build(&seven_hourly_records()).unwrap();

        // targets are 100 + position; row 0 here is position 1
        assert_eq!(feature(&matrix, 0, "aqi_lag_1"), 100.0);
        assert_eq!(feature(&matrix, 0, "aqi_roll_3"), 100.5);
    }

    #[test]
    fn test_empty_input_is_distinct_from_insufficient_history() {
        let builder = FeatureBuilder::new(FeatureConfig::default()).unwrap();

        assert_eq!(builder.build(&[]).unwrap_err(), FeatureError::EmptyInput);

        let records = seven_hourly_records()[..3].to_vec();
        assert_eq!(
            builder.build(&records).unwrap_err(),
            FeatureError::InsufficientHistory { input_rows: 3 }
        );
    }

    #[test]
    fn test_missing_target_drops_row() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();
        let mut records = seven_hourly_records();
        records[3].aqi = None;

        let matrix = builder.build(&records).unwrap();
        // position 3 loses its target; position 4 loses aqi_lag_1; rolling
        // means skip the gap, so nothing else is affected
        assert_eq!(matrix.n_rows(), 4);
        assert!(
            !matrix
                .keys()
                .iter()
                .any(|k| k.timestamp == records[3].timestamp)
        );
    }

    #[test]
    fn test_missing_base_value_drops_row() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();
        let mut records = seven_hourly_records();
        records[5].pm10 = f64::NAN;

        let matrix = builder.build(&records).unwrap();
        // position 5 has a missing feature value; position 6 loses pm10_lag_1
        assert_eq!(matrix.n_rows(), 4);
    }

    #[test]
    fn test_regions_are_independent() {
        let builder = FeatureBuilder::new(FeatureConfig {
            lags: vec![1],
            windows: vec![3],
        })
        .unwrap();

        let mut records = seven_hourly_records();
        records.extend(
            [80.0, 82.0]
                .iter()
                .enumerate()
                .map(|(h, pm)| record(2, h as u32, *pm, Some(200.0 + h as f64))),
        );

        let matrix = builder.build(&records).unwrap();
        // 6 surviving rows from region 1, 1 from region 2
        assert_eq!(matrix.n_rows(), 7);

        let region2_row = matrix
            .keys()
            .iter()
            .position(|k| k.region_id == 2)
            .unwrap();
        // region 2's lag reaches only its own history
        assert_eq!(feature(&matrix, region2_row, "pm25_lag_1"), 80.0);
        assert_eq!(feature(&matrix, region2_row, "pm25"), 82.0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = FeatureBuilder::new(FeatureConfig::default()).unwrap();
        let records = {
            let mut all = seven_hourly_records();
            for h in 7..20 {
                all.push(record(1, h, 10.0 + h as f64, Some(100.0 + h as f64)));
            }
            all
        };

        let first = builder.build(&records).unwrap();
        let second = builder.build(&records).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(vec![0], vec![3])]
    #[case(vec![1], vec![0])]
    fn test_zero_depths_are_rejected(#[case] lags: Vec<usize>, #[case] windows: Vec<usize>) {
        let result = FeatureBuilder::new(FeatureConfig { lags, windows });
        assert!(matches!(result, Err(FeatureError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_config() {
        let config = FeatureConfig::default();
        assert_eq!(config.lags, vec![1, 3, 6]);
        assert_eq!(config.windows, vec![3, 6]);
    }
}
