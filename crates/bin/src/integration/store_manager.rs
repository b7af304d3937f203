//! Store location and opening helpers.
//!
//! The database lives under the platform data directory by default so
//! repeated commands share one store without any flags.

use plume_data::error::Result;
use plume_data::store::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory Plume keeps its database in when no `--db` override is given.
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plume")
}

/// Default SQLite database path.
pub(crate) fn default_store_path() -> PathBuf {
    default_data_dir().join("plume.db")
}

/// Open the store at `path`, creating parent directories on first use.
pub(crate) fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    SqliteStore::new(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path_is_namespaced() {
        let path = default_store_path();
        assert!(path.ends_with("plume/plume.db"));
    }
}
