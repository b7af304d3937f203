//! Fixed registry of Indian monitoring regions with zone classifications.

use crate::regions::zone::Zone;
use plume_data::openaq::normalize_location_name;
use std::collections::HashMap;

/// A known monitoring region with its geographic zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownRegion {
    /// Canonical display name.
    pub name: String,
    /// Geographic zone.
    pub zone: Zone,
}

impl KnownRegion {
    /// Create a new known region.
    pub fn new(name: impl Into<String>, zone: Zone) -> Self {
        Self {
            name: name.into(),
            zone,
        }
    }
}

/// Registry of known Indian monitoring regions.
///
/// Lookups normalize the query the same way the transform step normalizes
/// payload location names, so "  NEW DELHI " and "new delhi" resolve to the
/// same entry.
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    regions: Vec<KnownRegion>,
    normalized_index: HashMap<String, usize>,
}

impl RegionRegistry {
    /// Create a registry seeded with the default region table.
    pub fn new() -> Self {
        let regions = Self::default_regions();
        let normalized_index = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (normalize_location_name(&r.name), i))
            .collect();

        Self {
            regions,
            normalized_index,
        }
    }

    /// Get all known regions.
    pub fn regions(&self) -> &[KnownRegion] {
        &self.regions
    }

    /// Get all canonical region names.
    pub fn names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    /// Look up a region by name, matching case-insensitively.
    pub fn get(&self, name: &str) -> Option<&KnownRegion> {
        self.normalized_index
            .get(&normalize_location_name(name))
            .map(|&i| &self.regions[i])
    }

    /// Get the zone for a region name, matching case-insensitively.
    pub fn zone(&self, name: &str) -> Option<Zone> {
        self.get(name).map(|r| r.zone)
    }

    /// Get the canonical display spelling for a region name.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(|r| r.name.as_str())
    }

    /// Check whether a name resolves to a known region.
    pub fn contains(&self, name: &str) -> bool {
        self.normalized_index
            .contains_key(&normalize_location_name(name))
    }

    /// Get the number of known regions.
    pub fn size(&self) -> usize {
        self.regions.len()
    }

    /// Get all region names in a specific zone.
    pub fn names_in_zone(&self, zone: Zone) -> Vec<String> {
        self.regions
            .iter()
            .filter(|r| r.zone == zone)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Get the count of regions per zone.
    pub fn zone_counts(&self) -> HashMap<Zone, usize> {
        let mut counts = HashMap::new();
        for region in &self.regions {
            *counts.entry(region.zone).or_insert(0) += 1;
        }
        counts
    }

    /// Default region table: major Indian cities with OpenAQ coverage,
    /// spanning all six zones.
    fn default_regions() -> Vec<KnownRegion> {
        use Zone::*;

        vec![
            // Northern - 8 regions
            KnownRegion::new("New Delhi", Northern),
            KnownRegion::new("Chandigarh", Northern),
            KnownRegion::new("Jaipur", Northern),
            KnownRegion::new("Amritsar", Northern),
            KnownRegion::new("Ludhiana", Northern),
            KnownRegion::new("Gurugram", Northern),
            KnownRegion::new("Faridabad", Northern),
            KnownRegion::new("Srinagar", Northern),
            // Central - 9 regions
            KnownRegion::new("Lucknow", Central),
            KnownRegion::new("Kanpur", Central),
            KnownRegion::new("Varanasi", Central),
            KnownRegion::new("Agra", Central),
            KnownRegion::new("Noida", Central),
            KnownRegion::new("Ghaziabad", Central),
            KnownRegion::new("Bhopal", Central),
            KnownRegion::new("Indore", Central),
            KnownRegion::new("Raipur", Central),
            // Eastern - 7 regions
            KnownRegion::new("Kolkata", Eastern),
            KnownRegion::new("Patna", Eastern),
            KnownRegion::new("Bhubaneswar", Eastern),
            KnownRegion::new("Ranchi", Eastern),
            KnownRegion::new("Jamshedpur", Eastern),
            KnownRegion::new("Durgapur", Eastern),
            KnownRegion::new("Siliguri", Eastern),
            // Western - 7 regions
            KnownRegion::new("Mumbai", Western),
            KnownRegion::new("Pune", Western),
            KnownRegion::new("Nagpur", Western),
            KnownRegion::new("Nashik", Western),
            KnownRegion::new("Ahmedabad", Western),
            KnownRegion::new("Surat", Western),
            KnownRegion::new("Vadodara", Western),
            // Southern - 9 regions
            KnownRegion::new("Chennai", Southern),
            KnownRegion::new("Bengaluru", Southern),
            KnownRegion::new("Hyderabad", Southern),
            KnownRegion::new("Kochi", Southern),
            KnownRegion::new("Coimbatore", Southern),
            KnownRegion::new("Madurai", Southern),
            KnownRegion::new("Mysuru", Southern),
            KnownRegion::new("Visakhapatnam", Southern),
            KnownRegion::new("Thiruvananthapuram", Southern),
            // North Eastern - 4 regions
            KnownRegion::new("Guwahati", NorthEastern),
            KnownRegion::new("Shillong", NorthEastern),
            KnownRegion::new("Imphal", NorthEastern),
            KnownRegion::new("Agartala", NorthEastern),
        ]
    }
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
