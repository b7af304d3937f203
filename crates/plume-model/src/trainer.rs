//! End-to-end model training over a feature matrix.
//!
//! Partitions the rows, grows the ensemble on the training side, scores
//! the held-out side, and attributes every held-out prediction. The
//! outcome keeps predictions, contributions, and the partition itself
//! positionally aligned: entry `i` everywhere describes the same
//! evaluation row.

use crate::explain::{Attributions, ExplainError, TreeExplainer};
use crate::forest::{ForestConfig, ForestError, ForestRegressor};
use crate::split::{SplitConfig, SplitError, Splitter, TrainTestSplit};
use ndarray::{Array1, ArrayView1};
use plume_features::FeatureMatrix;
use thiserror::Error;

/// Errors from the training flow
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Partitioning error
    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    /// Ensemble fitting or prediction error
    #[error("Forest error: {0}")]
    Forest(#[from] ForestError),

    /// Attribution error
    #[error("Attribution error: {0}")]
    Explain(#[from] ExplainError),
}

/// Root mean squared error between predictions and observed values.
///
/// Callers guarantee equal lengths; both vectors come out of the same
/// partition here.
pub fn rmse(predictions: ArrayView1<'_, f64>, actuals: ArrayView1<'_, f64>) -> f64 {
    let n = predictions.len() as f64;
    let sum_sq: f64 = predictions
        .iter()
        .zip(actuals.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sum_sq / n).sqrt()
}

/// Mean absolute error between predictions and observed values.
pub fn mae(predictions: ArrayView1<'_, f64>, actuals: ArrayView1<'_, f64>) -> f64 {
    let n = predictions.len() as f64;
    let sum_abs: f64 = predictions
        .iter()
        .zip(actuals.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();
    sum_abs / n
}

/// Everything a finished training run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The fitted ensemble
    pub model: ForestRegressor,
    /// The partition the model was trained and scored on
    pub split: TrainTestSplit,
    /// Predictions for the evaluation rows, in partition order
    pub predictions: Array1<f64>,
    /// Root mean squared error on the evaluation rows
    pub rmse: f64,
    /// Mean absolute error on the evaluation rows
    pub mae: f64,
    /// Per-feature contributions for the evaluation rows
    pub attributions: Attributions,
}

/// Runs the split/fit/score/attribute sequence.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    splitter: Splitter,
    forest: ForestConfig,
}

impl ModelTrainer {
    /// Create a trainer, validating the partition configuration.
    pub fn new(split: SplitConfig, forest: ForestConfig) -> Result<Self, TrainingError> {
        Ok(Self {
            splitter: Splitter::new(split)?,
            forest,
        })
    }

    /// The ensemble configuration in use.
    pub const fn forest_config(&self) -> &ForestConfig {
        &self.forest
    }

    /// The partition configuration in use.
    pub const fn split_config(&self) -> &SplitConfig {
        self.splitter.config()
    }

    /// Train on the matrix and score the held-out rows.
    pub fn train(&self, matrix: &FeatureMatrix) -> Result<TrainingOutcome, TrainingError> {
        let split = self.splitter.split(matrix)?;

        let model = ForestRegressor::fit(
            self.forest.clone(),
            split.train_features.view(),
            split.train_targets.view(),
            matrix.feature_names(),
        )?;

        let predictions = model.predict(split.eval_features.view())?;
        let rmse = rmse(predictions.view(), split.eval_targets.view());
        let mae = mae(predictions.view(), split.eval_targets.view());

        let attributions = TreeExplainer::new(&model).attributions(split.eval_features.view())?;

        Ok(TrainingOutcome {
            model,
            split,
            predictions,
            rmse,
            mae,
            attributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use ndarray::{Array1, Array2, array};
    use plume_features::RowKey;

    fn matrix(n: usize) -> FeatureMatrix {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let keys = (0..n)
            .map(|i| RowKey {
                region_id: 1 + (i % 3) as i64,
                timestamp: start + Duration::hours(i as i64),
            })
            .collect();
        let features = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                (i % 17) as f64
            } else {
                ((i * 5) % 11) as f64
            }
        });
        let targets = Array1::from_shape_fn(n, |i| {
            3.0 * features[[i, 0]] + 0.5 * features[[i, 1]]
        });
        FeatureMatrix::new(
            vec!["x0".to_string(), "x1".to_string()],
            features,
            targets,
            keys,
        )
        .unwrap()
    }

    #[test]
    fn test_metrics_formulas() {
        let predictions = array![3.0, 5.0];
        let actuals = array![1.0, 1.0];
        assert_relative_eq!(
            rmse(predictions.view(), actuals.view()),
            10.0_f64.sqrt()
        );
        assert_relative_eq!(mae(predictions.view(), actuals.view()), 3.0);
    }

    #[test]
    fn test_perfect_predictions_score_zero() {
        let values = array![2.0, 4.0, 8.0];
        assert_eq!(rmse(values.view(), values.view()), 0.0);
        assert_eq!(mae(values.view(), values.view()), 0.0);
    }

    #[test]
    fn test_outcome_counts_line_up() {
        let trainer = ModelTrainer::new(
            SplitConfig::default(),
            ForestConfig {
                n_trees: 20,
                ..Default::default()
            },
        )
        .unwrap();
        let outcome = trainer.train(&matrix(50)).unwrap();

        // ceil(0.2 * 50) evaluation rows everywhere
        assert_eq!(outcome.split.n_eval(), 10);
        assert_eq!(outcome.predictions.len(), 10);
        assert_eq!(outcome.attributions.n_rows(), 10);
        assert_eq!(outcome.attributions.contributions().ncols(), 2);
        assert_eq!(outcome.split.n_train(), 40);
    }

    #[test]
    fn test_contributions_reconstruct_eval_predictions() {
        let trainer = ModelTrainer::new(
            SplitConfig::default(),
            ForestConfig {
                n_trees: 10,
                ..Default::default()
            },
        )
        .unwrap();
        let outcome = trainer.train(&matrix(60)).unwrap();

        for (reconstructed, prediction) in outcome
            .attributions
            .reconstructed()
            .iter()
            .zip(outcome.predictions.iter())
        {
            assert_relative_eq!(reconstructed, prediction, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_learnable_function_scores_well() {
        let trainer = ModelTrainer::new(
            SplitConfig::default(),
            ForestConfig {
                n_trees: 30,
                ..Default::default()
            },
        )
        .unwrap();
        let outcome = trainer.train(&matrix(120)).unwrap();

        // deterministic function of two features seen many times over
        assert!(outcome.rmse.is_finite());
        assert!(outcome.rmse < 5.0, "rmse {}", outcome.rmse);
        assert!(outcome.mae <= outcome.rmse);
    }

    #[test]
    fn test_invalid_split_config_fails_construction() {
        let result = ModelTrainer::new(
            SplitConfig {
                test_fraction: 1.5,
                seed: 42,
            },
            ForestConfig::default(),
        );
        assert!(matches!(result, Err(TrainingError::Split(_))));
    }

    #[test]
    fn test_tiny_matrix_fails_with_split_error() {
        let trainer =
            ModelTrainer::new(SplitConfig::default(), ForestConfig::default()).unwrap();
        let result = trainer.train(&matrix(1));
        assert!(matches!(result, Err(TrainingError::Split(_))));
    }

    #[test]
    fn test_training_is_deterministic() {
        let trainer = ModelTrainer::new(
            SplitConfig::default(),
            ForestConfig {
                n_trees: 8,
                ..Default::default()
            },
        )
        .unwrap();
        let m = matrix(50);
        let first = trainer.train(&m).unwrap();
        let second = trainer.train(&m).unwrap();

        assert_eq!(first.predictions, second.predictions);
        assert_eq!(first.rmse.to_bits(), second.rmse.to_bits());
        assert_eq!(
            first.attributions.contributions(),
            second.attributions.contributions()
        );
    }
}
