#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/plume-aq/plume/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod explain;
pub mod forest;
pub mod split;
pub mod trainer;
pub mod tree;

// Re-export common types
pub use explain::{Attributions, ExplainError, TreeExplainer};
pub use forest::{ForestConfig, ForestError, ForestRegressor};
pub use split::{SplitConfig, SplitError, Splitter, TrainTestSplit};
pub use trainer::{ModelTrainer, TrainingError, TrainingOutcome, mae, rmse};
pub use tree::{RegressionTree, TreeConfig};

/// Version of the plume-model crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
