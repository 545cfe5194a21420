use serde::{Deserialize, Serialize};

use crate::{
    constants::{Meter, Second},
    geo::{FlatGeoPoint, FlatProjection, GeoPoint},
};

/// A GPS fix as delivered by the flight-state collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub location: GeoPoint,
    /// Seconds on the fix clock (UTC-relative, monotonic within a flight)
    pub time: Second,
    /// Navigation altitude in meters
    pub altitude: Meter,
    /// Netto / vertical speed sample in m/s
    pub vario: f64,
}

impl Fix {
    pub fn new(location: GeoPoint, time: Second, altitude: Meter) -> Self {
        Fix {
            location,
            time,
            altitude,
            vario: 0.0,
        }
    }
}

/// A sample of the stored flight trace.
///
/// Created once from a [`Fix`] and the trace's current projection; never mutated afterwards.
/// `time` is both the ordering key and the identity of the point inside a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub location: GeoPoint,
    pub flat_location: FlatGeoPoint,
    pub time: Second,
    pub altitude: Meter,
    pub vario: f64,
}

impl TracePoint {
    pub fn from_fix(fix: &Fix, projection: &FlatProjection) -> Self {
        TracePoint {
            location: fix.location,
            flat_location: projection.project(&fix.location),
            time: fix.time,
            altitude: fix.altitude,
            vario: fix.vario,
        }
    }

    /// Altitude rounded to whole meters, as used by the altitude-loss rules.
    pub fn integer_altitude(&self) -> i32 {
        self.altitude.round() as i32
    }

    pub fn flat_distance_to(&self, other: &TracePoint) -> u32 {
        self.flat_location.distance_to(&other.flat_location)
    }

    pub fn distance(&self, other: &TracePoint) -> Meter {
        self.location.distance(&other.location)
    }

    /// Absolute time difference in seconds.
    pub fn delta_time(&self, other: &TracePoint) -> Second {
        self.time.abs_diff(other.time)
    }

    pub fn is_newer_than(&self, other: &TracePoint) -> bool {
        self.time > other.time
    }

    pub fn is_older_than(&self, other: &TracePoint) -> bool {
        self.time < other.time
    }
}
