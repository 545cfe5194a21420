//! Scoring rulesets on top of the solvers.
//!
//! * [`result`] – [`ContestResult`] and the [`ContestStatistics`] slots.
//! * [`scoring`] – handicap formulas, best-so-far bookkeeping and the [`Contest`] trait.
//! * [`policies`] – path, triangle, league and composite policies.
//! * [`ruleset`] – the [`ContestKind`] catalogue and its policy wiring.
//! * [`manager`] – the [`ContestManager`] driving everything tick by tick.

pub mod manager;
pub mod policies;
pub mod result;
pub mod ruleset;
pub mod scoring;

pub use manager::ContestManager;
pub use policies::{
    CompositeContest, CompositeRule, ContestPolicy, LeagueContest, PathContest, PathScoring, TriangleContest,
    TriangleScoring,
};
pub use result::{ContestResult, ContestStatistics, ContestTraceVector, NUM_RESULT_SLOTS};
pub use ruleset::{ContestKind, Ruleset};
pub use scoring::{apply_handicap, apply_shifted_handicap, effective_handicap, Contest, ContestBest};
