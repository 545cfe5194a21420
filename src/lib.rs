//! # xcscore
//!
//! Incremental cross-country contest optimisation over a thinned GPS trace.
//!
//! Fixes go into a bounded [`Trace`](trace::Trace); every tick a
//! [`ContestManager`](contest::ContestManager) lets the path and triangle searches of the
//! configured ruleset continue where they stopped, and publishes the best results in
//! [`ContestStatistics`](contest::ContestStatistics).
//!
//! ```text
//! Fix ──► Trace ──► TraceManager snapshots ──► PathSolver / TriangleSolver
//!                                                   │
//!                           ContestStatistics ◄── policies (Contest trait)
//! ```

pub mod constants;
pub mod contest;
pub mod contest_errors;
pub mod counters;
pub mod geo;
pub mod settings;
pub mod solvers;
pub mod trace;

pub use contest::{ContestKind, ContestManager, ContestResult, ContestStatistics};
pub use contest_errors::ContestError;
pub use settings::{ContestSettings, SolverTuning};
pub use solvers::SolverResult;
pub use trace::{Fix, Trace};
