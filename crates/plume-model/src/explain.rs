//! Additive per-feature attribution of ensemble predictions.
//!
//! Every tree node carries the mean target of the rows that reached it,
//! so each split along a decision path moves the running estimate by
//! `child.value - node.value`. Charging that delta to the split feature
//! decomposes a tree's prediction exactly into its root mean plus one
//! term per feature, and averaging over trees does the same for the
//! ensemble:
//!
//! `prediction = base_value + sum(contributions)`
//!
//! holds for every row, up to float summation order.

use crate::forest::ForestRegressor;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use thiserror::Error;

/// Errors from attribution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExplainError {
    /// Row width differs from the model's feature count
    #[error("Feature count mismatch: model has {expected} features, rows have {actual}")]
    FeatureCountMismatch {
        /// Feature count the model was fitted on
        expected: usize,
        /// Column count of the rows handed in
        actual: usize,
    },
}

/// Per-feature contributions for a block of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributions {
    base_value: f64,
    contributions: Array2<f64>,
}

impl Attributions {
    /// Shared starting estimate: the mean of all root values.
    pub const fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Contribution matrix, shaped [rows x features], column order
    /// matching the model's feature names.
    pub const fn contributions(&self) -> &Array2<f64> {
        &self.contributions
    }

    /// Number of explained rows.
    pub fn n_rows(&self) -> usize {
        self.contributions.nrows()
    }

    /// Reconstruct each row's prediction as base plus contribution sum.
    pub fn reconstructed(&self) -> Array1<f64> {
        self.contributions.sum_axis(Axis(1)) + self.base_value
    }
}

/// Walks decision paths of a fitted ensemble to attribute predictions.
#[derive(Debug, Clone, Copy)]
pub struct TreeExplainer<'a> {
    model: &'a ForestRegressor,
}

impl<'a> TreeExplainer<'a> {
    /// Create an explainer over a fitted model.
    pub const fn new(model: &'a ForestRegressor) -> Self {
        Self { model }
    }

    /// Mean of the tree root values. Under bootstrap each tree's root
    /// mean differs slightly from the training mean; their average is
    /// the ensemble's starting estimate.
    pub fn base_value(&self) -> f64 {
        let sum: f64 = self.model.trees().iter().map(|t| t.root_value()).sum();
        sum / self.model.n_trees() as f64
    }

    /// Attribute every row of a feature block.
    pub fn attributions(
        &self,
        features: ArrayView2<'_, f64>,
    ) -> Result<Attributions, ExplainError> {
        let n_features = self.model.n_features();
        if features.ncols() != n_features {
            return Err(ExplainError::FeatureCountMismatch {
                expected: n_features,
                actual: features.ncols(),
            });
        }

        let rows: Vec<Vec<f64>> = features
            .outer_iter()
            .into_par_iter()
            .map(|row| self.row_contributions(row))
            .collect();

        let n_rows = rows.len();
        let mut contributions = Array2::zeros((n_rows, n_features));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                contributions[[i, j]] = value;
            }
        }

        Ok(Attributions {
            base_value: self.base_value(),
            contributions,
        })
    }

    fn row_contributions(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut acc = vec![0.0; self.model.n_features()];
        for tree in self.model.trees() {
            let nodes = tree.nodes();
            let mut idx = 0;
            while let Some(split) = nodes[idx].split {
                let child = if row[split.feature] <= split.threshold {
                    split.left
                } else {
                    split.right
                };
                acc[split.feature] += nodes[child].value - nodes[idx].value;
                idx = child;
            }
        }
        let n_trees = self.model.n_trees() as f64;
        for value in &mut acc {
            *value /= n_trees;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestConfig;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{i}")).collect()
    }

    fn fit(
        config: ForestConfig,
        features: &Array2<f64>,
        targets: &Array1<f64>,
    ) -> ForestRegressor {
        let width = features.ncols();
        ForestRegressor::fit(config, features.view(), targets.view(), &names(width)).unwrap()
    }

    #[test]
    fn test_contributions_reconstruct_predictions() {
        let features = Array2::from_shape_fn((60, 3), |(i, j)| {
            ((i * 7 + j * 13) % 23) as f64 * 0.5
        });
        let targets = Array1::from_shape_fn(60, |i| {
            2.0 * features[[i, 0]] - features[[i, 1]] + (i as f64 * 0.3).sin()
        });
        let model = fit(
            ForestConfig {
                n_trees: 15,
                ..Default::default()
            },
            &features,
            &targets,
        );

        let explainer = TreeExplainer::new(&model);
        let attributions = explainer.attributions(features.view()).unwrap();
        let predictions = model.predict(features.view()).unwrap();

        assert_eq!(attributions.n_rows(), 60);
        assert_eq!(attributions.contributions().ncols(), 3);
        for (reconstructed, prediction) in
            attributions.reconstructed().iter().zip(predictions.iter())
        {
            assert_relative_eq!(reconstructed, prediction, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_feature_gets_no_credit() {
        let features = Array2::from_shape_fn(
            (40, 2),
            |(i, j)| if j == 0 { i as f64 } else { 7.0 },
        );
        let targets = Array1::from_shape_fn(40, |i| if i >= 20 { 10.0 } else { 0.0 });
        let model = fit(
            ForestConfig {
                n_trees: 10,
                ..Default::default()
            },
            &features,
            &targets,
        );

        let attributions = TreeExplainer::new(&model)
            .attributions(features.view())
            .unwrap();
        // a constant column never hosts a split
        for row in attributions.contributions().outer_iter() {
            assert_eq!(row[1], 0.0);
        }
    }

    #[test]
    fn test_constant_target_attributes_nothing() {
        let features = Array2::from_shape_fn((20, 2), |(i, j)| (i + j) as f64);
        let targets = Array1::from_elem(20, 3.5);
        let model = fit(
            ForestConfig {
                n_trees: 5,
                ..Default::default()
            },
            &features,
            &targets,
        );

        let attributions = TreeExplainer::new(&model)
            .attributions(features.view())
            .unwrap();
        assert_relative_eq!(attributions.base_value(), 3.5);
        for value in attributions.contributions() {
            assert_eq!(*value, 0.0);
        }
    }

    #[test]
    fn test_base_value_without_bootstrap_is_the_training_mean() {
        let features = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let targets = Array1::from_shape_fn(30, |i| i as f64 * 2.0);
        let model = fit(
            ForestConfig {
                n_trees: 6,
                bootstrap: false,
                ..Default::default()
            },
            &features,
            &targets,
        );

        let mean = targets.sum() / 30.0;
        assert_relative_eq!(
            TreeExplainer::new(&model).base_value(),
            mean,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let features = Array2::from_shape_fn((10, 2), |(i, j)| (i + j) as f64);
        let targets = Array1::from_shape_fn(10, |i| i as f64);
        let model = fit(
            ForestConfig {
                n_trees: 3,
                ..Default::default()
            },
            &features,
            &targets,
        );

        let narrow = Array2::<f64>::zeros((4, 1));
        assert_eq!(
            TreeExplainer::new(&model)
                .attributions(narrow.view())
                .unwrap_err(),
            ExplainError::FeatureCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
