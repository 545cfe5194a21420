use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Meter, Radian, EARTH_RADIUS, RADEG};

/// A geodetic location on the FAI sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: Degree,
    pub longitude: Degree,
}

impl GeoPoint {
    pub fn new(latitude: Degree, longitude: Degree) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    pub fn latitude_rad(&self) -> Radian {
        self.latitude * RADEG
    }

    pub fn longitude_rad(&self) -> Radian {
        self.longitude * RADEG
    }

    /// Unit vector of this location in an Earth-centered frame.
    fn unit_vector(&self) -> Vector3<f64> {
        let (sin_lat, cos_lat) = self.latitude_rad().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_rad().sin_cos();
        Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Central angle between two locations.
    ///
    /// Uses `atan2(|a×b|, a·b)`, which stays accurate both for tiny separations
    /// (loop closure checks) and for near-antipodal points.
    pub fn central_angle(&self, other: &GeoPoint) -> Radian {
        let a = self.unit_vector();
        let b = other.unit_vector();
        a.cross(&b).norm().atan2(a.dot(&b))
    }

    /// Great-circle distance in meters.
    pub fn distance(&self, other: &GeoPoint) -> Meter {
        self.central_angle(other) * EARTH_RADIUS
    }

    /// Location reached by moving `distance` meters due north (negative: south).
    pub fn offset_north(&self, distance: Meter) -> GeoPoint {
        GeoPoint::new(
            (self.latitude + distance / EARTH_RADIUS / RADEG).clamp(-90.0, 90.0),
            self.longitude,
        )
    }

    /// Location reached by moving `distance` meters due east along the parallel.
    pub fn offset_east(&self, distance: Meter) -> GeoPoint {
        let cos_lat = self.latitude_rad().cos().max(1e-9);
        GeoPoint::new(
            self.latitude,
            self.longitude + distance / (EARTH_RADIUS * cos_lat) / RADEG,
        )
    }
}
