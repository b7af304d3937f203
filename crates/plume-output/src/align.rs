//! Binding model outputs to persistable identities.
//!
//! Training works positionally: entry `i` of the predictions, the
//! contribution matrix, and the evaluation keys all describe the same
//! row. This module freezes that alignment into records: every
//! prediction gets a fresh identifier, and every (prediction, feature)
//! pair becomes one explanation row pointing back at it. Lengths are
//! re-checked here because a silent off-by-one would persist predictions
//! against the wrong region and hour.

use chrono::{DateTime, Utc};
use ndarray::{ArrayView1, ArrayView2};
use plume_data::types::{AttributionRecord, PredictionRecord};
use plume_features::RowKey;
use thiserror::Error;
use uuid::Uuid;

/// Errors from result alignment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignmentError {
    /// Positionally aligned inputs disagree on length
    #[error("Count mismatch aligning {what}: expected {expected}, got {actual}")]
    CountMismatch {
        /// Which input disagreed
        what: &'static str,
        /// Length implied by the row keys
        expected: usize,
        /// Length actually handed in
        actual: usize,
    },
}

/// The persistable outcome of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRun {
    /// One record per evaluation row, in partition order
    pub predictions: Vec<PredictionRecord>,
    /// One record per (evaluation row, feature), grouped by prediction
    pub attributions: Vec<AttributionRecord>,
}

impl AlignedRun {
    /// Number of prediction records.
    pub fn n_predictions(&self) -> usize {
        self.predictions.len()
    }

    /// Number of explanation records.
    pub fn n_attributions(&self) -> usize {
        self.attributions.len()
    }
}

/// Builds persistable records out of positionally aligned model outputs.
///
/// # Example
///
/// ```no_run
/// use plume_output::ResultAligner;
/// # fn example(
/// #     keys: &[plume_features::RowKey],
/// #     predictions: ndarray::ArrayView1<'_, f64>,
/// #     names: &[String],
/// #     values: ndarray::ArrayView2<'_, f64>,
/// #     contributions: ndarray::ArrayView2<'_, f64>,
/// # ) -> Result<(), plume_output::AlignmentError> {
/// let aligner = ResultAligner::new("rf-v1.0");
/// let run = aligner.align(
///     keys,
///     predictions,
///     names,
///     values,
///     contributions,
///     chrono::Utc::now(),
/// )?;
/// assert_eq!(run.n_attributions(), run.n_predictions() * names.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResultAligner {
    model_version: String,
}

impl ResultAligner {
    /// Create an aligner that stamps records with the given model version.
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
        }
    }

    /// The version label stamped onto every record.
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Produce prediction and explanation records for one run.
    ///
    /// `keys` are the evaluation rows in partition order; `predictions`,
    /// the rows of `feature_values`, and the rows of `contributions`
    /// must follow the same order. `predicted_at` becomes the prediction
    /// timestamp on every record; each key's own timestamp becomes the
    /// target timestamp. The confidence score is a reserved column and
    /// stays empty.
    pub fn align(
        &self,
        keys: &[RowKey],
        predictions: ArrayView1<'_, f64>,
        feature_names: &[String],
        feature_values: ArrayView2<'_, f64>,
        contributions: ArrayView2<'_, f64>,
        predicted_at: DateTime<Utc>,
    ) -> Result<AlignedRun, AlignmentError> {
        let n_rows = keys.len();
        check_count("predictions", n_rows, predictions.len())?;
        check_count("feature value rows", n_rows, feature_values.nrows())?;
        check_count("contribution rows", n_rows, contributions.nrows())?;

        let n_features = feature_names.len();
        check_count("feature value columns", n_features, feature_values.ncols())?;
        check_count("contribution columns", n_features, contributions.ncols())?;

        let mut prediction_records = Vec::with_capacity(n_rows);
        let mut attribution_records = Vec::with_capacity(n_rows * n_features);

        for (pos, key) in keys.iter().enumerate() {
            let prediction_id = Uuid::new_v4();
            prediction_records.push(PredictionRecord {
                id: prediction_id,
                region_id: key.region_id,
                prediction_timestamp: predicted_at,
                target_timestamp: key.timestamp,
                predicted_aqi: predictions[pos],
                confidence_score: None,
                model_version: self.model_version.clone(),
            });

            for (feature, name) in feature_names.iter().enumerate() {
                attribution_records.push(AttributionRecord {
                    id: Uuid::new_v4(),
                    prediction_id,
                    feature_name: name.clone(),
                    feature_value: feature_values[[pos, feature]],
                    contribution: contributions[[pos, feature]],
                });
            }
        }

        Ok(AlignedRun {
            predictions: prediction_records,
            attributions: attribution_records,
        })
    }
}

fn check_count(what: &'static str, expected: usize, actual: usize) -> Result<(), AlignmentError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AlignmentError::CountMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::{Array1, Array2, array};
    use std::collections::HashSet;

    fn keys(n: usize) -> Vec<RowKey> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| RowKey {
                region_id: 10 + i as i64,
                timestamp: start + chrono::Duration::hours(i as i64),
            })
            .collect()
    }

    fn names() -> Vec<String> {
        vec!["pm25".to_string(), "pm25_lag_1".to_string()]
    }

    #[test]
    fn test_alignment_preserves_row_identity() {
        let aligner = ResultAligner::new("rf-v1.0");
        let keys = keys(3);
        let predictions = array![101.0, 102.0, 103.0];
        let values = Array2::from_shape_fn((3, 2), |(i, j)| (i * 10 + j) as f64);
        let contributions = Array2::from_shape_fn((3, 2), |(i, j)| (i + j) as f64 * 0.5);
        let predicted_at = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();

        let run = aligner
            .align(
                &keys,
                predictions.view(),
                &names(),
                values.view(),
                contributions.view(),
                predicted_at,
            )
            .unwrap();

        assert_eq!(run.n_predictions(), 3);
        for (pos, record) in run.predictions.iter().enumerate() {
            assert_eq!(record.region_id, keys[pos].region_id);
            assert_eq!(record.target_timestamp, keys[pos].timestamp);
            assert_eq!(record.prediction_timestamp, predicted_at);
            assert_eq!(record.predicted_aqi, predictions[pos]);
            assert_eq!(record.confidence_score, None);
            assert_eq!(record.model_version, "rf-v1.0");
        }
    }

    #[test]
    fn test_one_attribution_per_prediction_and_feature() {
        let aligner = ResultAligner::new("rf-v1.0");
        let keys = keys(3);
        let predictions = Array1::zeros(3);
        let values = Array2::from_shape_fn((3, 2), |(i, j)| (i * 2 + j) as f64);
        let contributions = values.clone() * 0.1;

        let run = aligner
            .align(
                &keys,
                predictions.view(),
                &names(),
                values.view(),
                contributions.view(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(run.n_attributions(), 6);
        for (pos, record) in run.predictions.iter().enumerate() {
            let rows: Vec<_> = run
                .attributions
                .iter()
                .filter(|a| a.prediction_id == record.id)
                .collect();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].feature_name, "pm25");
            assert_eq!(rows[1].feature_name, "pm25_lag_1");
            assert_eq!(rows[0].feature_value, values[[pos, 0]]);
            assert_eq!(rows[1].contribution, contributions[[pos, 1]]);
        }
    }

    #[test]
    fn test_identifiers_are_unique() {
        let aligner = ResultAligner::new("rf-v1.0");
        let keys = keys(5);
        let predictions = Array1::zeros(5);
        let block = Array2::zeros((5, 2));

        let run = aligner
            .align(
                &keys,
                predictions.view(),
                &names(),
                block.view(),
                block.view(),
                Utc::now(),
            )
            .unwrap();

        let mut seen = HashSet::new();
        for record in &run.predictions {
            assert!(seen.insert(record.id));
        }
        for record in &run.attributions {
            assert!(seen.insert(record.id));
        }
        assert_eq!(seen.len(), 5 + 10);
    }

    #[test]
    fn test_length_mismatches_are_rejected() {
        let aligner = ResultAligner::new("rf-v1.0");
        let keys = keys(3);
        let block = Array2::zeros((3, 2));

        let short_predictions = Array1::zeros(2);
        assert_eq!(
            aligner
                .align(
                    &keys,
                    short_predictions.view(),
                    &names(),
                    block.view(),
                    block.view(),
                    Utc::now(),
                )
                .unwrap_err(),
            AlignmentError::CountMismatch {
                what: "predictions",
                expected: 3,
                actual: 2
            }
        );

        let narrow = Array2::zeros((3, 1));
        assert_eq!(
            aligner
                .align(
                    &keys,
                    Array1::zeros(3).view(),
                    &names(),
                    narrow.view(),
                    block.view(),
                    Utc::now(),
                )
                .unwrap_err(),
            AlignmentError::CountMismatch {
                what: "feature value columns",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_empty_run_aligns_to_empty_records() {
        let aligner = ResultAligner::new("rf-v1.0");
        let run = aligner
            .align(
                &[],
                Array1::zeros(0).view(),
                &names(),
                Array2::zeros((0, 2)).view(),
                Array2::zeros((0, 2)).view(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(run.n_predictions(), 0);
        assert_eq!(run.n_attributions(), 0);
    }
}
