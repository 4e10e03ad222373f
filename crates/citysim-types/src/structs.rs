//! Small value types shared by the world model and percepts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RoleName;

/// Two coordinates closer than this on both axes are the same place.
pub const LOCATION_EPSILON: f64 = 1e-9;

/// A point on the city map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl Location {
    /// Create a location from latitude and longitude.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether `other` denotes the same place.
    pub fn same_place(&self, other: &Self) -> bool {
        (self.lat - other.lat).abs() < LOCATION_EPSILON
            && (self.lon - other.lon).abs() < LOCATION_EPSILON
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// An entity role: how fast it moves, how much it carries, how much charge
/// its battery holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Role {
    /// Role name.
    pub name: RoleName,
    /// Map cells covered per round (cell size is set by the match).
    pub speed: u64,
    /// Inventory capacity in item volume units.
    pub load: u32,
    /// Maximum battery charge.
    pub battery: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_place_tolerates_rounding() {
        let a = Location::new(51.4885, -0.1321);
        let b = Location::new(51.488_500_000_000_1, -0.1321);
        assert!(a.same_place(&b));
        assert!(!a.same_place(&Location::new(51.4886, -0.1321)));
    }
}
