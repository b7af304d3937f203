//! Bagged ensemble of regression trees.
//!
//! Each tree grows on a bootstrap resample of the training rows, seeded
//! per tree from the ensemble seed, and the prediction is the mean over
//! trees. Trees are grown in parallel; the result is independent of
//! worker scheduling because every tree derives its sample from its own
//! index.

use crate::tree::{RegressionTree, TreeConfig};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from fitting or applying the ensemble
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForestError {
    /// Training sample is empty
    #[error("Training sample is empty")]
    EmptySample,

    /// Dimension mismatch between inputs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees (default: 200)
    pub n_trees: usize,
    /// Depth limit per tree; `None` grows until pure (default: None)
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before splitting (default: 2)
    pub min_samples_split: usize,
    /// Minimum rows each side of a split must keep (default: 1)
    pub min_samples_leaf: usize,
    /// Resample rows with replacement per tree (default: true)
    pub bootstrap: bool,
    /// Base seed; tree `i` draws its sample from `seed + i` (default: 42)
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A fitted bagged-tree regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    config: ForestConfig,
    feature_names: Vec<String>,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl ForestRegressor {
    /// Fit the ensemble on the given rows.
    ///
    /// `feature_names` travel with the model so a serialized artifact
    /// stays interpretable on its own.
    pub fn fit(
        config: ForestConfig,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        feature_names: &[String],
    ) -> Result<Self, ForestError> {
        if config.n_trees == 0 {
            return Err(ForestError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if config.min_samples_split < 2 {
            return Err(ForestError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if config.min_samples_leaf == 0 {
            return Err(ForestError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }

        let (n_rows, n_features) = features.dim();
        if n_rows == 0 {
            return Err(ForestError::EmptySample);
        }
        if targets.len() != n_rows {
            return Err(ForestError::DimensionMismatch {
                expected: n_rows,
                actual: targets.len(),
            });
        }
        if feature_names.len() != n_features {
            return Err(ForestError::DimensionMismatch {
                expected: n_features,
                actual: feature_names.len(),
            });
        }

        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let indices: Vec<usize> = if config.bootstrap {
                    let mut rng =
                        ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(t as u64));
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                RegressionTree::fit(&tree_config, features, targets, &indices)
            })
            .collect();

        Ok(Self {
            config,
            feature_names: feature_names.to_vec(),
            n_features,
            trees,
        })
    }

    /// Predict a single row: the mean over all tree predictions.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of a feature block.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForestError> {
        if features.ncols() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }
        let predictions: Vec<f64> = features
            .outer_iter()
            .map(|row| self.predict_row(row))
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// The fitted trees.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of feature columns the model was fitted on.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Ordered feature names the model was fitted on.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The configuration the model was fitted with.
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }
}
