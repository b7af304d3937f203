#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/plume-aq/plume/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod builder;
pub mod error;
pub mod matrix;
pub mod schema;

// Re-export common types
pub use arena::{RegionArena, RegionGroup};
pub use builder::{FeatureBuilder, FeatureConfig};
pub use error::{FeatureError, Result};
pub use matrix::{FeatureMatrix, RowKey};

/// Version of the plume-features crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
