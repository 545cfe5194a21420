use serde::{Deserialize, Serialize};

use crate::constants::{Meter, EARTH_RADIUS, RADEG};

use super::geo_point::GeoPoint;

/// Truncated Euclidean length of an integer vector.
///
/// Both the lower and the upper bounding-box distance go through this function so that,
/// for degenerate single-point boxes, they agree exactly.
#[inline]
fn hypot_u32(dx: i64, dy: i64) -> u32 {
    ((dx * dx + dy * dy) as f64).sqrt() as u32
}

/// A point on the flat, integer projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlatGeoPoint {
    pub x: i32,
    pub y: i32,
}

impl FlatGeoPoint {
    pub fn new(x: i32, y: i32) -> Self {
        FlatGeoPoint { x, y }
    }

    pub fn distance_squared(&self, other: &FlatGeoPoint) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy) as u64
    }

    /// Rounded Euclidean distance in flat units.
    pub fn distance_to(&self, other: &FlatGeoPoint) -> u32 {
        (self.distance_squared(other) as f64).sqrt().round() as u32
    }
}

/// Axis-aligned box on the projection plane (edges inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatBoundingBox {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

impl FlatBoundingBox {
    /// A degenerate box holding a single point.
    pub fn new(point: FlatGeoPoint) -> Self {
        FlatBoundingBox {
            left: point.x,
            bottom: point.y,
            right: point.x,
            top: point.y,
        }
    }

    pub fn expand(&mut self, point: FlatGeoPoint) {
        self.left = self.left.min(point.x);
        self.right = self.right.max(point.x);
        self.bottom = self.bottom.min(point.y);
        self.top = self.top.max(point.y);
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.right) - i64::from(self.left)) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.top) - i64::from(self.bottom)) as u32
    }

    pub fn is_inside(&self, point: &FlatGeoPoint) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }

    pub fn overlaps(&self, other: &FlatBoundingBox) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.bottom <= other.top
            && other.bottom <= self.top
    }

    /// Smallest distance between any two points of the two boxes (0 if they overlap).
    pub fn distance(&self, other: &FlatBoundingBox) -> u32 {
        let dx = (i64::from(other.left) - i64::from(self.right))
            .max(i64::from(self.left) - i64::from(other.right))
            .max(0);
        let dy = (i64::from(other.bottom) - i64::from(self.top))
            .max(i64::from(self.bottom) - i64::from(other.top))
            .max(0);
        hypot_u32(dx, dy)
    }

    /// Largest distance between any two points of the two boxes.
    pub fn max_distance(&self, other: &FlatBoundingBox) -> u32 {
        let dx = (i64::from(self.right) - i64::from(other.left))
            .max(i64::from(other.right) - i64::from(self.left));
        let dy = (i64::from(self.top) - i64::from(other.bottom))
            .max(i64::from(other.top) - i64::from(self.bottom));
        hypot_u32(dx, dy)
    }
}

/// Equirectangular projection onto a plane tangent at `origin`.
///
/// One flat unit is one meter along the meridian; along the parallel the scale is exact at
/// the origin latitude and degrades with `cos(lat) / cos(origin_lat)` away from it, which is
/// negligible over the extent of a single flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatProjection {
    origin: GeoPoint,
    cos_origin_lat: f64,
}

impl Default for FlatProjection {
    fn default() -> Self {
        FlatProjection::new(GeoPoint::default())
    }
}

impl FlatProjection {
    pub fn new(origin: GeoPoint) -> Self {
        FlatProjection {
            origin,
            cos_origin_lat: origin.latitude_rad().cos().max(1e-9),
        }
    }

    pub fn reset(&mut self, origin: GeoPoint) {
        *self = FlatProjection::new(origin);
    }

    pub fn origin(&self) -> &GeoPoint {
        &self.origin
    }

    pub fn project(&self, location: &GeoPoint) -> FlatGeoPoint {
        let mut d_lon = location.longitude - self.origin.longitude;
        if d_lon > 180.0 {
            d_lon -= 360.0;
        } else if d_lon < -180.0 {
            d_lon += 360.0;
        }
        let d_lat = location.latitude - self.origin.latitude;

        FlatGeoPoint::new(
            (d_lon * RADEG * EARTH_RADIUS * self.cos_origin_lat).round() as i32,
            (d_lat * RADEG * EARTH_RADIUS).round() as i32,
        )
    }

    /// Flat-unit range that covers at least `distance` meters around `location`.
    ///
    /// The east-west scale at `location` differs from the origin's; the larger of the two axes
    /// is returned so range queries never miss a candidate.
    pub fn project_range(&self, location: &GeoPoint, distance: Meter) -> u32 {
        let cos_lat = location.latitude_rad().cos().max(1e-9);
        let x_scale = self.cos_origin_lat / cos_lat;
        (distance * x_scale.max(1.0)).ceil() as u32
    }
}

#[cfg(test)]
mod flat_test {
    use super::*;

    #[test]
    fn test_projection_scale_near_origin() {
        let origin = GeoPoint::new(46.0, 7.0);
        let projection = FlatProjection::new(origin);

        assert_eq!(projection.project(&origin), FlatGeoPoint::new(0, 0));

        let north = projection.project(&origin.offset_north(5000.0));
        assert_eq!(north.x, 0);
        assert!((north.y - 5000).abs() <= 1);

        let east = projection.project(&origin.offset_east(5000.0));
        assert!((east.x - 5000).abs() <= 1);
        assert_eq!(east.y, 0);
    }

    #[test]
    fn test_project_range_is_generous() {
        let projection = FlatProjection::new(GeoPoint::new(45.0, 0.0));
        let further_north = GeoPoint::new(50.0, 0.0);
        assert!(projection.project_range(&further_north, 1000.0) > 1000);
        assert_eq!(projection.project_range(projection.origin(), 1000.0), 1000);
    }

    #[test]
    fn test_bounding_box_distances() {
        let mut a = FlatBoundingBox::new(FlatGeoPoint::new(0, 0));
        a.expand(FlatGeoPoint::new(10, 10));
        let b = FlatBoundingBox::new(FlatGeoPoint::new(13, 14));

        assert_eq!(a.width(), 10);
        assert_eq!(a.height(), 10);
        assert_eq!(a.distance(&b), 5);
        assert_eq!(b.distance(&a), 5);
        // far corner (0,0) to (13,14)
        assert_eq!(a.max_distance(&b), 19);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_single_point_boxes_agree() {
        let a = FlatBoundingBox::new(FlatGeoPoint::new(-300, 1200));
        let b = FlatBoundingBox::new(FlatGeoPoint::new(4100, -7));
        assert_eq!(a.distance(&b), a.max_distance(&b));
    }
}
