//! The flat feature matrix handed between pipeline stages.

use crate::error::{FeatureError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// The (region, timestamp) identity of one feature row, kept for later
/// alignment of predictions back to their originating records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowKey {
    /// Region the row came from
    pub region_id: i64,
    /// Timestamp of the originating record
    pub timestamp: DateTime<Utc>,
}

/// An ordered feature matrix with positionally aligned targets and row keys.
///
/// The column set is fixed at construction and shared between training and
/// evaluation; every row holds a finite value for every feature and for the
/// target.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    feature_names: Vec<String>,
    features: Array2<f64>,
    targets: Array1<f64>,
    keys: Vec<RowKey>,
}

impl FeatureMatrix {
    /// Assemble a matrix from its parts, validating that all dimensions
    /// agree.
    pub fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        targets: Array1<f64>,
        keys: Vec<RowKey>,
    ) -> Result<Self> {
        if features.ncols() != feature_names.len() {
            return Err(FeatureError::InvalidShape(format!(
                "{} feature columns but {} names",
                features.ncols(),
                feature_names.len()
            )));
        }
        if features.nrows() != targets.len() || features.nrows() != keys.len() {
            return Err(FeatureError::InvalidShape(format!(
                "{} rows, {} targets, {} keys",
                features.nrows(),
                targets.len(),
                keys.len()
            )));
        }
        Ok(Self {
            feature_names,
            features,
            targets,
            keys,
        })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Ordered feature column names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The feature values, shaped [rows x features].
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// The target vector, aligned with the rows by position.
    pub fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    /// Row identities, aligned with the rows by position.
    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    /// One row's feature values.
    ///
    /// Panics when `idx` is out of range, like slice indexing.
    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.features.row(idx)
    }

    /// Materialize the feature and target subset at the given row indices,
    /// in the given order.
    ///
    /// Panics when an index is out of range, like slice indexing.
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (
            self.features.select(Axis(0), indices),
            self.targets.select(Axis(0), indices),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::{arr1, arr2};

    fn key(region_id: i64, hour: u32) -> RowKey {
        RowKey {
            region_id,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap(),
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_new_validates_dimensions() {
        let features = arr2(&[[1.0, 2.0], [3.0, 4.0]]);

        let bad_names = FeatureMatrix::new(
            names(3),
            features.clone(),
            arr1(&[1.0, 2.0]),
            vec![key(1, 0), key(1, 1)],
        );
        assert!(matches!(bad_names, Err(FeatureError::InvalidShape(_))));

        let bad_targets = FeatureMatrix::new(
            names(2),
            features.clone(),
            arr1(&[1.0]),
            vec![key(1, 0), key(1, 1)],
        );
        assert!(matches!(bad_targets, Err(FeatureError::InvalidShape(_))));

        let bad_keys =
            FeatureMatrix::new(names(2), features, arr1(&[1.0, 2.0]), vec![key(1, 0)]);
        assert!(matches!(bad_keys, Err(FeatureError::InvalidShape(_))));
    }

    #[test]
    fn test_select_materializes_rows_in_order() {
        let matrix = FeatureMatrix::new(
            names(2),
            arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
            arr1(&[10.0, 20.0, 30.0]),
            vec![key(1, 0), key(1, 1), key(1, 2)],
        )
        .unwrap();

        let (features, targets) = matrix.select(&[2, 0]);
        assert_eq!(features, arr2(&[[5.0, 6.0], [1.0, 2.0]]));
        assert_eq!(targets, arr1(&[30.0, 10.0]));
    }

    #[test]
    fn test_accessors() {
        let matrix = FeatureMatrix::new(
            names(2),
            arr2(&[[1.0, 2.0]]),
            arr1(&[10.0]),
            vec![key(7, 5)],
        )
        .unwrap();

        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.n_features(), 2);
        assert_eq!(matrix.feature_names(), &["f0".to_string(), "f1".to_string()]);
        assert_eq!(matrix.keys()[0].region_id, 7);
        assert_eq!(matrix.row(0)[1], 2.0);
    }
}
