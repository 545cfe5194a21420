use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Work counters of one solver, or the sum over several.
///
/// Each solver owns its counters; [`crate::contest::ContestManager::counters`] adds them up.
/// They are reset together with the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveCounters {
    /// Calls to `solve`
    pub solves: u64,
    /// Edges relaxed by the multi-stage search
    pub relaxations: u64,
    /// Candidate sets expanded by the branch-and-bound search
    pub bnb_iterations: u64,
    /// Largest branch-and-bound tree seen
    pub peak_tree_size: usize,
    /// Snapshots rebuilt from scratch
    pub full_resyncs: u64,
    /// Snapshots extended with new points only
    pub tail_resyncs: u64,
}

impl SolveCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tree_size(&mut self, size: usize) {
        self.peak_tree_size = self.peak_tree_size.max(size);
    }
}

impl AddAssign for SolveCounters {
    fn add_assign(&mut self, other: Self) {
        self.solves += other.solves;
        self.relaxations += other.relaxations;
        self.bnb_iterations += other.bnb_iterations;
        self.peak_tree_size = self.peak_tree_size.max(other.peak_tree_size);
        self.full_resyncs += other.full_resyncs;
        self.tail_resyncs += other.tail_resyncs;
    }
}
