//! Geographic helpers for proximity search.
//!
//! Distances use the Haversine great-circle formula on a spherical Earth.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Latitude/longitude rectangle in decimal degrees.
///
/// Used as a cheap pre-filter in SQL before the exact Haversine check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Smallest box (up to the antimeridian) containing every point within
    /// `radius_km` of `center`.
    ///
    /// When the circle reaches a pole or crosses the antimeridian the
    /// longitude range is widened to the full [-180, 180].
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let lat = center.latitude.to_radians();

        let min_lat = lat - angular;
        let max_lat = lat + angular;

        if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
            return Self {
                min_latitude: min_lat.to_degrees().max(-90.0),
                max_latitude: max_lat.to_degrees().min(90.0),
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        let d_lon = (angular.sin() / lat.cos()).asin().to_degrees();
        let (min_lon, max_lon) = (center.longitude - d_lon, center.longitude + d_lon);
        let (min_longitude, max_longitude) = if min_lon < -180.0 || max_lon > 180.0 {
            (-180.0, 180.0)
        } else {
            (min_lon, max_lon)
        };

        Self {
            min_latitude: min_lat.to_degrees(),
            max_latitude: max_lat.to_degrees(),
            min_longitude,
            max_longitude,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MADRID: GeoPoint = GeoPoint {
        latitude: 40.4168,
        longitude: -3.7038,
    };
    const BARCELONA: GeoPoint = GeoPoint {
        latitude: 41.3874,
        longitude: 2.1686,
    };

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_km(MADRID, MADRID), 0.0);
    }

    #[test]
    fn test_haversine_madrid_barcelona() {
        let d = haversine_km(MADRID, BARCELONA);
        assert!((d - 505.0).abs() < 5.0, "got {}", d);
        assert!((d - haversine_km(BARCELONA, MADRID)).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_antipodes() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((haversine_km(a, b) - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_point_validity() {
        assert!(MADRID.is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_bounding_box_contains_circle() {
        let bbox = BoundingBox::around(MADRID, 600.0);
        assert!(bbox.contains(MADRID));
        assert!(bbox.contains(BARCELONA));

        let tight = BoundingBox::around(MADRID, 100.0);
        assert!(!tight.contains(BARCELONA));
    }

    #[test]
    fn test_bounding_box_edges_are_within_radius() {
        let radius = 50.0;
        let bbox = BoundingBox::around(MADRID, radius);
        let north = GeoPoint::new(bbox.max_latitude, MADRID.longitude);
        let east = GeoPoint::new(MADRID.latitude, bbox.max_longitude);
        assert!((haversine_km(MADRID, north) - radius).abs() < 0.01);
        // The longitude extent is reached at a latitude slightly off the
        // centre, so the point on the centre's parallel lies a bit further out.
        assert!(haversine_km(MADRID, east) >= radius - 0.01);
    }

    #[test]
    fn test_bounding_box_near_pole_spans_all_longitudes() {
        let bbox = BoundingBox::around(GeoPoint::new(89.9, 10.0), 50.0);
        assert_eq!(bbox.max_latitude, 90.0);
        assert_eq!(bbox.min_longitude, -180.0);
        assert_eq!(bbox.max_longitude, 180.0);
    }

    #[test]
    fn test_bounding_box_across_antimeridian() {
        let bbox = BoundingBox::around(GeoPoint::new(0.0, 179.9), 100.0);
        assert!(bbox.contains(GeoPoint::new(0.0, -179.9)));
    }
}
