//! # Constants and type definitions for xcscore
//!
//! This module centralizes the **geodetic constants**, **contest thresholds**, and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Earth model and unit conversions
//! - Trace store sampling limits
//! - Solver budgets and closing thresholds
//! - Core type aliases used across the crate
//!
//! Thresholds that were tuned empirically (relaxed-pair ratio, per-tick branch-and-bound quota)
//! are only *defaults* here; the live values travel in [`SolverTuning`](crate::settings::SolverTuning).

// -------------------------------------------------------------------------------------------------
// Earth model and unit conversions
// -------------------------------------------------------------------------------------------------

/// Radius of the FAI sphere in meters
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Meters in a kilometer
pub const METERS_PER_KM: f64 = 1000.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Time in seconds (fix clock, monotonic within a flight)
pub type Second = u32;

// -------------------------------------------------------------------------------------------------
// Trace store
// -------------------------------------------------------------------------------------------------

/// Fixes closer than this to the previous point are dropped.
pub const MIN_SAMPLE_SPACING: Second = 2;

/// A fix going back in time by more than this clears the whole trace.
pub const BACKWARD_JUMP_LIMIT: Second = 180;

/// Default capacity of the trace store.
pub const DEFAULT_TRACE_CAPACITY: usize = 1024;

/// Default window (seconds before the newest point) protected from thinning.
pub const DEFAULT_NO_THIN_TIME: Second = 60;

// -------------------------------------------------------------------------------------------------
// Contest rules
// -------------------------------------------------------------------------------------------------

/// Default maximum altitude loss between start and finish (meters).
pub const DEFAULT_FINISH_ALT_DIFF: u32 = 1000;

/// Maximum distance between the two ends of a closed loop (FAI-OLC: 1 km).
pub const MAX_CLOSING_DISTANCE: Meter = 1000.0;

/// Sprint / league window: 2.5 hours.
pub const SPRINT_WINDOW: Second = 9000;

/// Duration used to turn sprint distance into a speed score.
pub const SPRINT_HOURS: f64 = 2.5;

/// Triangles at least this long may use the relaxed 25 % shortest-leg rule.
pub const LARGE_TRIANGLE_DISTANCE: Meter = 500_000.0;

/// Slightly lower large-triangle breakpoint used only for the relaxed feasibility bound.
pub const LARGE_TRIANGLE_RELAXED_DISTANCE: Meter = 490_000.0;

/// Assumed maximum ground speed, used to skip loops too short in time to matter (m/s).
pub const MAX_GROUND_SPEED: f64 = 100.0;

/// Maximum start/finish gap for gap-penalised triangles, as a fraction of the perimeter.
pub const MAX_GAP_RATIO: f64 = 0.2;

/// A handicap of zero disables handicapping; it is treated as this value.
pub const NEUTRAL_HANDICAP: u32 = 100;

// -------------------------------------------------------------------------------------------------
// Solver limits
// -------------------------------------------------------------------------------------------------

/// Upper bound on search stages (start + turnpoints + finish).
pub const MAX_STAGES: usize = 10;

/// Stage weights are expressed in fifths; 5 means a weight of 1.0.
pub const UNIT_STAGE_WEIGHT: u32 = 5;

/// Dijkstra relaxations per non-exhaustive tick.
pub const DIJKSTRA_TICK_BUDGET: usize = 25;

/// Relaxed closing pairs expand index ranges by this share of the point count.
pub const RELAX_RATIO: f64 = 0.03;

/// Branch-and-bound quota per predictive tick is `n_points² / TICK_ITERATION_DIVISOR`.
pub const TICK_ITERATION_DIVISOR: usize = 8;

/// Hard ceiling on branch-and-bound iterations per run.
pub const MAX_BNB_ITERATIONS: usize = 1_000_000;

/// Hard ceiling on the branch-and-bound tree size.
pub const MAX_BNB_TREE_SIZE: usize = 500_000;
