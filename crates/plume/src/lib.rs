#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/plume-aq/plume/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;
pub mod regions;

// Re-export main types from sub-crates
pub use plume_data as data;
pub use plume_features as features;
pub use plume_model as model;
pub use plume_output as output;

// Re-export common pipeline and region types
pub use pipeline::{PipelineError, TrainingOptions, run_training};
pub use regions::{KnownRegion, RegionRegistry, Zone};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
