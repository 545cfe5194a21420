//! # Geodesy and flat projection
//!
//! Solvers work on integer, locally-flat coordinates so that bounding boxes, quad-tree
//! queries and edge weights stay cheap. Final distances are always recomputed on the sphere.
//!
//! - [`GeoPoint`] – latitude/longitude in degrees, great-circle distance.
//! - [`FlatProjection`] – equirectangular projection centered on the first fix of the flight.
//! - [`FlatGeoPoint`] / [`FlatBoundingBox`] – integer plane primitives.

pub mod flat;
pub mod geo_point;

pub use flat::{FlatBoundingBox, FlatGeoPoint, FlatProjection};
pub use geo_point::GeoPoint;
