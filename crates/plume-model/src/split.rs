//! Seeded train/eval partitioning of the feature matrix.
//!
//! Rows are shuffled with a seeded generator and the first
//! `ceil(test_fraction * n)` of the permutation become the evaluation
//! set. The shuffle ignores timestamps: with lagged features an
//! evaluation row can share history with later training rows, so the
//! reported scores read optimistic. The partition is kept as-is and the
//! caveat travels with the run report.

use ndarray::{Array1, Array2};
use plume_features::FeatureMatrix;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from partitioning
#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    /// Evaluation fraction outside the open unit interval
    #[error("Invalid test fraction: {0} (must be strictly between 0 and 1)")]
    InvalidFraction(f64),

    /// Too few rows to leave both sides non-empty
    #[error("Too few rows to split: {rows}")]
    TooFewRows {
        /// Rows available in the matrix
        rows: usize,
    },
}

/// Partitioning configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation (default: 0.2)
    pub test_fraction: f64,
    /// Shuffle seed (default: 42)
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// A materialized train/eval partition.
///
/// Index vectors refer to rows of the source matrix and keep the
/// shuffled order; the arrays are those rows copied out in the same
/// order, so position `i` of `eval_indices` and of every `eval_*` field
/// describe the same row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Source-matrix indices of the training rows
    pub train_indices: Vec<usize>,
    /// Source-matrix indices of the evaluation rows
    pub eval_indices: Vec<usize>,
    /// Training feature rows
    pub train_features: Array2<f64>,
    /// Training targets
    pub train_targets: Array1<f64>,
    /// Evaluation feature rows
    pub eval_features: Array2<f64>,
    /// Evaluation targets
    pub eval_targets: Array1<f64>,
}

impl TrainTestSplit {
    /// Number of training rows.
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    /// Number of evaluation rows.
    pub fn n_eval(&self) -> usize {
        self.eval_indices.len()
    }
}

/// Shuffles and partitions a feature matrix.
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitConfig,
}

impl Splitter {
    /// Create a splitter, rejecting fractions outside (0, 1).
    pub fn new(config: SplitConfig) -> Result<Self, SplitError> {
        if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
            return Err(SplitError::InvalidFraction(config.test_fraction));
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Partition the matrix. The same seed over the same matrix yields
    /// the identical partition.
    pub fn split(&self, matrix: &FeatureMatrix) -> Result<TrainTestSplit, SplitError> {
        let n = matrix.n_rows();
        let n_eval = (self.config.test_fraction * n as f64).ceil() as usize;
        if n_eval >= n {
            return Err(SplitError::TooFewRows { rows: n });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let eval_indices = indices[..n_eval].to_vec();
        let train_indices = indices[n_eval..].to_vec();
        let (train_features, train_targets) = matrix.select(&train_indices);
        let (eval_features, eval_targets) = matrix.select(&eval_indices);

        Ok(TrainTestSplit {
            train_indices,
            eval_indices,
            train_features,
            train_targets,
            eval_features,
            eval_targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use ndarray::{Array1, Array2};
    use plume_features::RowKey;
    use rstest::rstest;

    fn matrix(n: usize) -> FeatureMatrix {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let keys = (0..n)
            .map(|i| RowKey {
                region_id: 1,
                timestamp: start + Duration::hours(i as i64),
            })
            .collect();
        FeatureMatrix::new(
            vec!["a".to_string(), "b".to_string()],
            Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64),
            Array1::from_shape_fn(n, |i| i as f64),
            keys,
        )
        .unwrap()
    }

    #[rstest]
    #[case(10, 0.2, 2)]
    #[case(7, 0.2, 2)]
    #[case(5, 0.5, 3)]
    #[case(100, 0.25, 25)]
    fn test_eval_count_rounds_up(#[case] n: usize, #[case] fraction: f64, #[case] expected: usize) {
        let splitter = Splitter::new(SplitConfig {
            test_fraction: fraction,
            seed: 42,
        })
        .unwrap();
        let split = splitter.split(&matrix(n)).unwrap();
        assert_eq!(split.n_eval(), expected);
        assert_eq!(split.n_train(), n - expected);
    }

    #[test]
    fn test_partition_covers_all_rows_exactly_once() {
        let splitter = Splitter::new(SplitConfig::default()).unwrap();
        let split = splitter.split(&matrix(50)).unwrap();

        let mut seen: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.eval_indices.iter())
            .copied()
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_rows_are_shuffled_not_truncated() {
        let splitter = Splitter::new(SplitConfig::default()).unwrap();
        let split = splitter.split(&matrix(50)).unwrap();
        assert_ne!(split.eval_indices, (0..split.n_eval()).collect::<Vec<_>>());
    }

    #[test]
    fn test_materialized_rows_match_indices() {
        let splitter = Splitter::new(SplitConfig::default()).unwrap();
        let m = matrix(20);
        let split = splitter.split(&m).unwrap();

        for (pos, &idx) in split.eval_indices.iter().enumerate() {
            assert_eq!(split.eval_targets[pos], idx as f64);
            assert_eq!(split.eval_features[[pos, 0]], (idx * 2) as f64);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let splitter = Splitter::new(SplitConfig::default()).unwrap();
        let m = matrix(40);
        assert_eq!(splitter.split(&m).unwrap(), splitter.split(&m).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        let m = matrix(40);
        let first = Splitter::new(SplitConfig {
            seed: 1,
            ..Default::default()
        })
        .unwrap()
        .split(&m)
        .unwrap();
        let second = Splitter::new(SplitConfig {
            seed: 2,
            ..Default::default()
        })
        .unwrap()
        .split(&m)
        .unwrap();
        assert_ne!(first.eval_indices, second.eval_indices);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.2)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_invalid_fractions_are_rejected(#[case] fraction: f64) {
        let result = Splitter::new(SplitConfig {
            test_fraction: fraction,
            seed: 42,
        });
        assert!(matches!(result, Err(SplitError::InvalidFraction(_))));
    }

    #[test]
    fn test_too_few_rows() {
        let splitter = Splitter::new(SplitConfig {
            test_fraction: 0.5,
            seed: 42,
        })
        .unwrap();
        assert_eq!(
            splitter.split(&matrix(1)).unwrap_err(),
            SplitError::TooFewRows { rows: 1 }
        );
    }
}
