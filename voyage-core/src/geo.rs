//! Coordinates, canonical rounding and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Validates the range of both components.
    pub fn new(lat: f64, lon: f64) -> Result<Self, AdvisoryError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if !valid {
            return Err(AdvisoryError::InvalidCoordinate { lat, lon });
        }

        Ok(Self { lat, lon })
    }

    /// Builds a coordinate from canonical hundredths of a degree.
    pub fn from_hundredths(lat_e2: i32, lon_e2: i32) -> Self {
        Self {
            lat: f64::from(lat_e2) / 100.0,
            lon: f64::from(lon_e2) / 100.0,
        }
    }

    /// Canonical form used for every forecast and advisory lookup.
    pub fn rounded(&self) -> Self {
        Self {
            lat: round_coordinate(self.lat),
            lon: round_coordinate(self.lon),
        }
    }

    /// Canonical form as integer hundredths, `(lat_e2, lon_e2)`.
    pub fn hundredths(&self) -> (i32, i32) {
        (to_hundredths(self.lat), to_hundredths(self.lon))
    }
}

/// Rounds to 2 decimal places (about 1.1 km), half away from zero.
pub fn round_coordinate(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Same rounding as [`round_coordinate`], kept as an exact integer key.
pub fn to_hundredths(x: f64) -> i32 {
    (x * 100.0).round() as i32
}

/// Haversine distance in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1]
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
