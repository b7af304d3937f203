//! Geographic zone definitions for Indian monitoring regions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six zonal-council groupings of Indian states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Northern zone (Delhi, Punjab, Haryana, Rajasthan, J&K)
    Northern,

    /// Central zone (Uttar Pradesh, Madhya Pradesh, Chhattisgarh, Uttarakhand)
    Central,

    /// Eastern zone (West Bengal, Bihar, Jharkhand, Odisha)
    Eastern,

    /// Western zone (Maharashtra, Gujarat, Goa)
    Western,

    /// Southern zone (Tamil Nadu, Karnataka, Telangana, Andhra Pradesh, Kerala)
    Southern,

    /// North Eastern zone (Assam, Meghalaya, Manipur, Tripura)
    NorthEastern,
}

impl Zone {
    /// Returns all zones.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Northern,
            Self::Central,
            Self::Eastern,
            Self::Western,
            Self::Southern,
            Self::NorthEastern,
        ]
    }

    /// Returns the full zone name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Northern => "Northern",
            Self::Central => "Central",
            Self::Eastern => "Eastern",
            Self::Western => "Western",
            Self::Southern => "Southern",
            Self::NorthEastern => "North Eastern",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
