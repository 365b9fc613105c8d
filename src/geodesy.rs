//! Spherical-earth destination point math.
//!
//! Displaces a geocoded base point along a compass bearing. Uses the
//! great-circle destination formula on a sphere of mean radius 3958.8 mi,
//! which stays correct near the poles and across the antimeridian.

use crate::offset::{Direction, OffsetSpec};
use std::f64::consts::PI;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

const DEG: f64 = PI / 180.0;

/// A base coordinate after a directional offset has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

impl ShiftedCoordinate {
    pub fn from_offset(lat: f64, lon: f64, offset: &OffsetSpec) -> Self {
        let (latitude, longitude) =
            apply_offset(lat, lon, offset.distance_miles(), offset.direction);
        Self {
            latitude,
            longitude,
            description: offset.describe(),
        }
    }
}

/// Move `distance_miles` from (`lat`, `lon`) toward `direction`.
pub fn apply_offset(lat: f64, lon: f64, distance_miles: f64, direction: Direction) -> (f64, f64) {
    destination(lat, lon, distance_miles, direction.bearing())
}

/// Destination point given a start, a distance and an initial bearing in degrees.
pub fn destination(lat: f64, lon: f64, distance_miles: f64, bearing_degrees: f64) -> (f64, f64) {
    if distance_miles == 0.0 {
        return (lat, normalize_longitude(lon));
    }

    let phi1 = lat * DEG;
    let lambda1 = lon * DEG;
    let theta = bearing_degrees * DEG;
    let delta = distance_miles / EARTH_RADIUS_MILES;

    let sin_phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos())
        .clamp(-1.0, 1.0);
    let phi2 = sin_phi2.asin();

    let y = theta.sin() * delta.sin() * phi1.cos();
    let x = delta.cos() - phi1.sin() * sin_phi2;
    let lambda2 = lambda1 + y.atan2(x);

    (phi2 / DEG, normalize_longitude(lambda2 / DEG))
}

/// Wrap a longitude into [-180, 180]. In-range values are returned as-is.
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const NILAND: (f64, f64) = (33.2400, -115.5186);

    #[test]
    fn test_zero_distance_identity() {
        for dir in Direction::ALL {
            let (lat, lon) = apply_offset(NILAND.0, NILAND.1, 0.0, dir);
            assert_eq!(lat, NILAND.0);
            assert_eq!(lon, NILAND.1);
        }
    }

    #[test]
    fn test_one_degree_north() {
        // One degree of arc on the mean sphere.
        let miles_per_degree = EARTH_RADIUS_MILES * DEG;
        let (lat, lon) = apply_offset(10.0, 20.0, miles_per_degree, Direction::N);
        assert_abs_diff_eq!(lat, 11.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_niland_five_miles_nw() {
        let (lat, lon) = apply_offset(NILAND.0, NILAND.1, 5.0, Direction::NW);
        assert!(lat > NILAND.0);
        assert!(lon < NILAND.1);
        assert_abs_diff_eq!(lat, 33.2912, epsilon = 1e-3);
        assert_abs_diff_eq!(lon, -115.5798, epsilon = 1e-3);
    }

    #[test]
    fn test_reverse_round_trip() {
        let starts = [NILAND, (0.0, 0.0), (-45.0, 170.0), (60.0, -10.0), (-33.87, 151.21)];
        for (lat, lon) in starts {
            for dir in Direction::ALL {
                let (lat2, lon2) = apply_offset(lat, lon, 5.0, dir);
                let (lat3, lon3) = apply_offset(lat2, lon2, 5.0, dir.reverse());
                assert_abs_diff_eq!(lat3, lat, epsilon = 1e-3);
                assert_abs_diff_eq!(lon3, lon, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_longitude_wraps_across_antimeridian() {
        let (_, lon) = apply_offset(0.0, 179.99, 10.0, Direction::E);
        assert!((-180.0..=180.0).contains(&lon));
        assert!(lon < 0.0);

        let (_, lon) = apply_offset(0.0, -179.99, 10.0, Direction::W);
        assert!((-180.0..=180.0).contains(&lon));
        assert!(lon > 0.0);
    }

    #[test]
    fn test_near_pole_stays_valid() {
        for dir in Direction::ALL {
            let (lat, lon) = apply_offset(89.99, 45.0, 50.0, dir);
            assert!(lat <= 90.0 && lat >= 88.0, "lat {} for {}", lat, dir);
            assert!((-180.0..=180.0).contains(&lon));
        }
    }

    #[test]
    fn test_longitude_always_in_range() {
        let mut lon = -180.0;
        while lon <= 180.0 {
            for dir in Direction::ALL {
                let (_, out) = apply_offset(45.0, lon, 500.0, dir);
                assert!((-180.0..=180.0).contains(&out));
            }
            lon += 15.0;
        }
    }

    #[test]
    fn test_deterministic() {
        let a = apply_offset(NILAND.0, NILAND.1, 7.25, Direction::ESE);
        let b = apply_offset(NILAND.0, NILAND.1, 7.25, Direction::ESE);
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_abs_diff_eq!(normalize_longitude(190.0), -170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(-190.0), 170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(540.0), -180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shifted_from_offset() {
        let spec = crate::offset::parse_offset("5mi NW of Niland").unwrap();
        let shifted = ShiftedCoordinate::from_offset(NILAND.0, NILAND.1, &spec);
        assert_eq!(shifted.description, "5mi NW (315\u{00B0})");
        assert!(shifted.latitude > NILAND.0);
    }
}
