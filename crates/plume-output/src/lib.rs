#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/plume-aq/plume/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod export;
pub mod report;

pub use align::{AlignedRun, AlignmentError, ResultAligner};
pub use export::{ExportError, ExportFormat, Exporter};
pub use report::{FeatureWeight, ReportError, RunReport, rank_features};

/// Version of the plume-output crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
