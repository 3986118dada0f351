use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 100.0;

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

    /// Great-circle (haversine) distance in kilometers
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Center + radius of a geospatial pre-filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl GeoRadius {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.distance_km(point) <= self.radius_km
    }
}

/// A listing id returned by the radius lookup, with its distance from the center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    pub id: String,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(6.5244, 3.3792);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn lagos_to_ibadan_is_about_114_km() {
        let lagos = GeoPoint::new(6.5244, 3.3792);
        let ibadan = GeoPoint::new(7.3775, 3.9470);
        let d = lagos.distance_km(&ibadan);
        assert!((d - 114.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        assert!((a.distance_km(&b) - 111.19).abs() < 0.1);
    }

    #[test]
    fn radius_containment_is_inclusive_of_nearby_points() {
        let radius = GeoRadius {
            center: GeoPoint::new(6.5244, 3.3792),
            radius_km: 5.0,
        };
        assert!(radius.contains(&GeoPoint::new(6.55, 3.38)));
        // ~8 km north
        assert!(!radius.contains(&GeoPoint::new(6.5964, 3.3792)));
    }
}
