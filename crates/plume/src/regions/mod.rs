//! Region management for the Plume pipeline.
//!
//! This module provides the fixed table of known Indian monitoring regions
//! and their geographic zone classifications. The registry is the seed set
//! for the store and the name authority for CLI display; lookups share the
//! location-name normalization used by payload transformation.

pub mod registry;
pub mod zone;

pub use registry::{KnownRegion, RegionRegistry};
pub use zone::Zone;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_roundtrip() {
        let registry = RegionRegistry::new();

        for region in registry.regions() {
            assert_eq!(registry.zone(&region.name), Some(region.zone));
        }
        assert!(!registry.contains("NOTREAL"));
    }
}
