//! Map geometry: distances, bounded movement, and map bounds.
//!
//! Movement is straight-line in coordinate space. An entity covers at most
//! `speed * cell_size` per round and lands exactly on its target once the
//! remaining distance fits into one round, so arrival is never off by a
//! rounding error no matter how large the speed is.

use citysim_types::Location;
use serde::Deserialize;

/// Euclidean distance between two locations in coordinate units.
pub fn distance(a: &Location, b: &Location) -> f64 {
    (a.lat - b.lat).hypot(a.lon - b.lon)
}

/// Result of advancing towards a target for one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Position after the step.
    pub location: Location,
    /// Whether the target was reached.
    pub arrived: bool,
}

/// Advance from `from` towards `to` by at most `max_distance`.
///
/// Returns the target itself (not an approximation) when it is within reach.
pub fn step_toward(from: &Location, to: &Location, max_distance: f64) -> Step {
    let remaining = distance(from, to);
    if remaining <= max_distance || from.same_place(to) {
        return Step {
            location: *to,
            arrived: true,
        };
    }

    let fraction = max_distance / remaining;
    Step {
        location: Location::new(
            from.lat + (to.lat - from.lat) * fraction,
            from.lon + (to.lon - from.lon) * fraction,
        ),
        arrived: false,
    }
}

/// The rectangle the map occupies.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MapBounds {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl MapBounds {
    /// Whether `location` lies inside the bounds (edges included).
    pub fn contains(&self, location: &Location) -> bool {
        (self.min_lat..=self.max_lat).contains(&location.lat)
            && (self.min_lon..=self.max_lon).contains(&location.lon)
    }

    /// The point at fractional position (`lat_frac`, `lon_frac`), each in `[0, 1]`.
    pub fn interpolate(&self, lat_frac: f64, lon_frac: f64) -> Location {
        Location::new(
            self.min_lat + (self.max_lat - self.min_lat) * lat_frac.clamp(0.0, 1.0),
            self.min_lon + (self.max_lon - self.min_lon) * lon_frac.clamp(0.0, 1.0),
        )
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            min_lat: 51.4647,
            max_lat: 51.5223,
            min_lon: -0.1978,
            max_lon: -0.0354,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(3.0, 4.0);
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn step_arrives_exactly_when_in_reach() {
        let from = Location::new(51.47, -0.19);
        let to = Location::new(51.51, -0.05);
        let step = step_toward(&from, &to, 1_000.0);
        assert!(step.arrived);
        assert!(step.location.same_place(&to));
    }

    #[test]
    fn step_moves_partially_when_out_of_reach() {
        let from = Location::new(0.0, 0.0);
        let to = Location::new(0.0, 10.0);
        let step = step_toward(&from, &to, 2.5);
        assert!(!step.arrived);
        assert!(step.location.same_place(&Location::new(0.0, 2.5)));
    }

    #[test]
    fn zero_distance_counts_as_arrival() {
        let here = Location::new(1.0, 1.0);
        let step = step_toward(&here, &here, 0.0);
        assert!(step.arrived);
    }

    #[test]
    fn bounds_interpolation_stays_inside() {
        let bounds = MapBounds::default();
        assert!(bounds.contains(&bounds.interpolate(0.0, 0.0)));
        assert!(bounds.contains(&bounds.interpolate(1.0, 1.0)));
        assert!(bounds.contains(&bounds.interpolate(0.3, 0.8)));
        assert!(bounds.contains(&bounds.interpolate(7.0, -2.0)));
    }

    #[test]
    fn map_bounds_deserialize_from_config() {
        let bounds: MapBounds = serde_json::from_str(
            r#"{"min_lat": 1.0, "max_lat": 2.0, "min_lon": -1.0, "max_lon": 0.5}"#,
        )
        .unwrap();
        assert!(bounds.contains(&Location::new(1.5, 0.0)));
        assert!(!bounds.contains(&Location::new(2.5, 0.0)));
    }
}
