//! # Handicaps and best-so-far bookkeeping
//!
//! Shared pieces of every scoring policy:
//!
//! * [`apply_handicap`] / [`apply_shifted_handicap`] – the two handicap formulas;
//! * [`ContestBest`] – the monotonic best result of a policy;
//! * [`Contest`] – the contract the [`ContestManager`](super::ContestManager) drives.

use crate::{
    constants::NEUTRAL_HANDICAP,
    counters::SolveCounters,
    solvers::SolverResult,
    trace::{Trace, TracePoint},
};

use super::result::{ContestResult, ContestTraceVector};

/// The handicap actually applied: 0 means "no handicap" and maps to 100.
pub fn effective_handicap(handicap: u32) -> u32 {
    if handicap == 0 {
        NEUTRAL_HANDICAP
    } else {
        handicap
    }
}

/// Standard handicap: `value × 100 / handicap`.
///
/// A handicap of 0 is treated as 100, which leaves the value unchanged.
pub fn apply_handicap(value: f64, handicap: u32) -> f64 {
    if handicap == 0 || handicap == NEUTRAL_HANDICAP {
        return value;
    }
    value * f64::from(NEUTRAL_HANDICAP) / f64::from(effective_handicap(handicap))
}

/// Shifted handicap used by sprint and league rulesets: `value × 400 / (3 × handicap + 100)`.
pub fn apply_shifted_handicap(value: f64, handicap: u32) -> f64 {
    if handicap == 0 || handicap == NEUTRAL_HANDICAP {
        return value;
    }
    value * 400.0 / (3.0 * f64::from(effective_handicap(handicap)) + 100.0)
}

/// Best result of a policy since its last reset.
///
/// A candidate replaces the current best only when its score is strictly greater, so the
/// best score never decreases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestBest {
    result: ContestResult,
    solution: ContestTraceVector,
}

impl ContestBest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn result(&self) -> ContestResult {
        self.result
    }

    pub fn solution(&self) -> &[TracePoint] {
        &self.solution
    }

    /// Return
    /// ----------
    /// * `true` if the candidate became the new best.
    pub fn update(&mut self, result: ContestResult, solution: &[TracePoint]) -> bool {
        if result.score <= self.result.score {
            return false;
        }
        self.result = result;
        self.solution = solution.iter().copied().collect();
        true
    }
}

/// A scoring policy driven tick by tick.
pub trait Contest {
    /// Forget the best result and all retained search state.
    fn reset(&mut self);

    /// Run one tick of the underlying search and score its outcome.
    ///
    /// Arguments
    /// -----------------
    /// * `trace` – The shared trace store.
    /// * `exhaustive` – Run every search to completion instead of respecting tick budgets.
    fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult;

    fn best_result(&self) -> ContestResult;

    fn best_solution(&self) -> &[TracePoint];

    /// Change the handicap. Scores are not comparable across handicaps, so a change resets
    /// the policy.
    fn set_handicap(&mut self, handicap: u32);

    fn set_incremental(&mut self, _incremental: bool) {}

    /// Work done by the underlying solvers.
    fn counters(&self) -> SolveCounters {
        SolveCounters::default()
    }
}

#[cfg(test)]
mod scoring_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_neutral_handicap_is_identity() {
        for value in [0.0, 1.0, 123.456, 1e6] {
            assert_eq!(apply_handicap(value, 100), value);
            assert_eq!(apply_handicap(value, 0), value);
            assert_eq!(apply_shifted_handicap(value, 100), value);
            assert_eq!(apply_shifted_handicap(value, 0), value);
        }
        assert_eq!(effective_handicap(0), 100);
        assert_eq!(effective_handicap(115), 115);
    }

    #[test]
    fn test_handicap_formulas() {
        assert_relative_eq!(apply_handicap(120.0, 120), 100.0);
        assert_relative_eq!(apply_handicap(100.0, 80), 125.0);
        // 400 / (3 × 120 + 100) = 0.8696
        assert_relative_eq!(apply_shifted_handicap(100.0, 120), 40_000.0 / 460.0);
    }

    #[test]
    fn test_best_only_increases() {
        let mut best = ContestBest::new();
        assert!(!best.update(ContestResult::new(0.0, 0.0, 0), &[]));
        assert!(best.update(ContestResult::new(10.0, 10_000.0, 600), &[]));
        assert!(!best.update(ContestResult::new(10.0, 12_000.0, 600), &[]));
        assert!(!best.update(ContestResult::new(5.0, 5_000.0, 600), &[]));
        assert!(best.update(ContestResult::new(11.0, 11_000.0, 600), &[]));
        assert_eq!(best.result().score, 11.0);

        best.reset();
        assert!(!best.result().is_defined());
    }
}
