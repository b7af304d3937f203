#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/plume-aq/plume/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod openaq;
pub mod store;
pub mod types;

pub use error::{DataError, Result};
pub use store::{DataStore, SqliteStore};
pub use types::MetricRecord;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
