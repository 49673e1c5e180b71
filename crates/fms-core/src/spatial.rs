//! Spatial math for route geometry: distances, bearings, relative offsets.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Initial bearing to `other` in radians, normalized to [0, 2π).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        bearing(self.lat, self.lon, other.lat, other.lon).rem_euclid(TWO_PI)
    }

    /// Signed (east, north) offsets in meters relative to `origin`.
    ///
    /// Equirectangular projection scaled at the origin latitude; accurate at
    /// terminal-area distances.
    pub fn relative_to(&self, origin: &Position) -> (f64, f64) {
        let east = (self.lon - origin.lon) * meters_per_deg_lon(origin.lat);
        let north = (self.lat - origin.lat) * meters_per_deg_lat(origin.lat);
        (east, north)
    }
}

/// Calculate distance between two points in meters using Haversine formula.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate bearing from point 1 to point 2 in radians.
/// Returns bearing in radians, 0 = north, π/2 = east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(36.08, -115.15, 36.08, -115.15);
        assert!(dist < 0.001);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = Position::new(36.0, -115.0);

        let north = Position::new(37.0, -115.0);
        assert!(origin.bearing_to(&north).abs() < 0.01);

        let east = Position::new(36.0, -114.0);
        assert!((origin.bearing_to(&east) - FRAC_PI_2).abs() < 0.01);

        // Due west comes back normalized into [0, 2π), not negative.
        let west = Position::new(36.0, -116.0);
        assert!((origin.bearing_to(&west) - 3.0 * FRAC_PI_2).abs() < 0.01);
    }

    #[test]
    fn relative_offsets_have_correct_signs() {
        let origin = Position::new(36.0, -115.0);
        let northeast = Position::new(36.1, -114.9);

        let (east, north) = northeast.relative_to(&origin);
        assert!(east > 0.0, "expected positive east offset, got {east}");
        assert!(north > 0.0, "expected positive north offset, got {north}");

        // ~0.1 degree of latitude is ~11km
        assert!((north - 11_113.0).abs() < 100.0);
    }
}
