//! # Triangle solver
//!
//! Finds the closed triangle with the largest perimeter among the trace points.
//!
//! ## Overview
//!
//! A triangle is made of a start, three turnpoints and a finish. Start and finish form a
//! *closing pair*: the finish lies within [`MAX_CLOSING_DISTANCE`] of the start and not too
//! far below it. The turnpoints lie between them and only their perimeter is scored.
//!
//! Each tick runs the following stages:
//!
//! 1. **Closing pairs** – on a full resync every point is range-queried in a [`QuadTree`]
//!    for earlier or later points that close a loop with it; on a tail resync only the new
//!    points are inserted and queried. Nested pairs are folded by [`ClosingPairs`].
//! 2. **Relaxed pairs** – consecutive pairs whose endpoints lie within a few percent of the
//!    point count of each other are searched together. A result that does not fit inside a
//!    single exact pair triggers a close look at each exact pair instead.
//! 3. **Branch and bound** – a [`CandidateSet`] holds three index ranges, each with the
//!    bounding box of its points. Sets are ordered by their perimeter upper bound `df_max`
//!    and the most promising one is split along its widest range until all three ranges
//!    are single points. Sets that cannot beat the best perimeter found so far are pruned.
//!
//! ## Predictive mode
//!
//! With `predict` the pilot is assumed to return to the start, so the whole snapshot is the
//! single closing pair `(0, n − 1)`. The branch-and-bound tree then survives between ticks
//! and each tick spends at most `n² / tick_iteration_divisor` iterations on it.
//!
//! See also
//! ------------
//! * [`crate::solvers::triangle_rules`] – feasibility and integrality checks.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    constants::{
        Meter, Second, DEFAULT_FINISH_ALT_DIFF, MAX_BNB_ITERATIONS, MAX_BNB_TREE_SIZE, MAX_CLOSING_DISTANCE,
        MAX_GROUND_SPEED, RELAX_RATIO, TICK_ITERATION_DIVISOR,
    },
    contest::result::ContestTraceVector,
    counters::SolveCounters,
    geo::FlatBoundingBox,
    trace::{Serial, Trace, TraceManager, TracePoint},
};

use super::{
    closing_pairs::{ClosingPair, ClosingPairs},
    quad_tree::QuadTree,
    triangle_rules::{TriangleRules, TriangleValidator},
    SolverResult,
};

/// Empirical budgets of the branch-and-bound search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleTuning {
    /// Fraction of the point count by which closing pairs are merged
    pub relax_ratio: f64,
    /// Per-tick quota in predictive mode is `n² / tick_iteration_divisor`
    pub tick_iteration_divisor: usize,
    /// Hard ceiling on iterations of one search
    pub max_iterations: usize,
    /// Hard ceiling on the number of open candidate sets
    pub max_tree_size: usize,
}

impl Default for TriangleTuning {
    fn default() -> Self {
        TriangleTuning {
            relax_ratio: RELAX_RATIO,
            tick_iteration_divisor: TICK_ITERATION_DIVISOR,
            max_iterations: MAX_BNB_ITERATIONS,
            max_tree_size: MAX_BNB_TREE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangleSolverConfig {
    pub rules: TriangleRules,
    /// Assume the pilot closes the loop at the newest point
    pub predict: bool,
    pub finish_alt_diff: u32,
}

impl TriangleSolverConfig {
    pub fn new(rules: TriangleRules) -> Self {
        TriangleSolverConfig {
            rules,
            predict: false,
            finish_alt_diff: DEFAULT_FINISH_ALT_DIFF,
        }
    }

    pub fn predict(mut self, predict: bool) -> Self {
        self.predict = predict;
        self
    }

    pub fn finish_alt_diff(mut self, finish_alt_diff: u32) -> Self {
        self.finish_alt_diff = finish_alt_diff;
        self
    }
}

/// Best triangle of a solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSolution {
    /// `[start, tp1, tp2, tp3, finish]`
    pub points: ContestTraceVector,
    /// Geodesic perimeter through the three turnpoints
    pub distance: Meter,
    /// Geodesic distance between start and finish
    pub gap: Meter,
    pub time: Second,
}

impl TriangleSolution {
    fn new(points: ContestTraceVector) -> Self {
        let d_12 = points[1].distance(&points[2]);
        let d_23 = points[2].distance(&points[3]);
        let d_31 = points[3].distance(&points[1]);

        TriangleSolution {
            distance: d_12 + d_23 + d_31,
            gap: points[0].distance(&points[4]),
            time: points[4].delta_time(&points[0]),
            points,
        }
    }

    /// The three leg lengths, tp1→tp2, tp2→tp3, tp3→tp1.
    pub fn legs(&self) -> [Meter; 3] {
        [
            self.points[1].distance(&self.points[2]),
            self.points[2].distance(&self.points[3]),
            self.points[3].distance(&self.points[1]),
        ]
    }
}

/// Index range `[index_min, index_max)` with the bounding box of its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TurnPointRange {
    index_min: usize,
    index_max: usize,
    bounding_box: FlatBoundingBox,
}

impl TurnPointRange {
    fn new(points: &[TracePoint], index_min: usize, index_max: usize) -> Self {
        debug_assert!(index_min < index_max);
        let mut bounding_box = FlatBoundingBox::new(points[index_min].flat_location);
        for point in &points[index_min + 1..index_max] {
            bounding_box.expand(point.flat_location);
        }
        TurnPointRange {
            index_min,
            index_max,
            bounding_box,
        }
    }

    /// Manhattan diagonal of the bounding box.
    fn diagonal(&self) -> u32 {
        self.bounding_box.width().saturating_add(self.bounding_box.height())
    }

    fn size(&self) -> usize {
        self.index_max - self.index_min
    }

    fn min_distance(&self, other: &TurnPointRange) -> u32 {
        self.bounding_box.distance(&other.bounding_box)
    }

    fn max_distance(&self, other: &TurnPointRange) -> u32 {
        self.bounding_box.max_distance(&other.bounding_box)
    }

    /// Halves of the range split at its midpoint.
    fn split(&self, points: &[TracePoint]) -> (usize, [TurnPointRange; 2]) {
        let split = (self.index_min + self.index_max) / 2;
        (
            split,
            [
                TurnPointRange::new(points, self.index_min, split),
                TurnPointRange::new(points, split, self.index_max),
            ],
        )
    }
}

/// Three turnpoint ranges and the perimeter bounds they allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CandidateSet {
    tp: [TurnPointRange; 3],
    df_min: u32,
    df_max: u32,
    shortest_max: u32,
    longest_min: u32,
    longest_max: u32,
}

impl CandidateSet {
    fn new(tp: [TurnPointRange; 3], validator: &TriangleValidator) -> Self {
        let mins = [tp[0].min_distance(&tp[1]), tp[1].min_distance(&tp[2]), tp[2].min_distance(&tp[0])];
        let maxs = [tp[0].max_distance(&tp[1]), tp[1].max_distance(&tp[2]), tp[2].max_distance(&tp[0])];

        let shortest_max = maxs.iter().copied().min().unwrap_or(0);
        let longest_max = maxs.iter().copied().max().unwrap_or(0);
        let longest_min = mins.iter().copied().max().unwrap_or(0);
        let sum_min = mins.iter().fold(0u32, |acc, d| acc.saturating_add(*d));
        let sum_max = maxs.iter().fold(0u32, |acc, d| acc.saturating_add(*d));

        CandidateSet {
            tp,
            df_min: sum_min.max(longest_min.saturating_mul(2)),
            df_max: validator.upper_bound(sum_max, shortest_max),
            shortest_max,
            longest_min,
            longest_max,
        }
    }

    /// All three turnpoints range over `[first, last]`.
    fn root(points: &[TracePoint], first: usize, last: usize, validator: &TriangleValidator) -> Self {
        let range = TurnPointRange::new(points, first, last + 1);
        CandidateSet::new([range; 3], validator)
    }

    fn is_feasible(&self, validator: &TriangleValidator) -> bool {
        validator.is_feasible(self.df_min, self.df_max, self.shortest_max, self.longest_min)
    }

    fn is_integral(&self, points: &[TracePoint], validator: &TriangleValidator) -> bool {
        if self.tp.iter().any(|range| range.size() != 1) {
            return false;
        }
        let [a, b, c] = self.tp.map(|range| &points[range.index_min].location);
        validator.is_integral(self.df_max, self.shortest_max, self.longest_max, [a, b, c])
    }

    /// Turnpoint indices in chronological order.
    fn sorted_turnpoints(&self) -> [usize; 3] {
        let mut indices = self.tp.map(|range| range.index_min);
        indices.sort_unstable();
        indices
    }
}

/// Integral candidate found by a branch-and-bound run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BnbCandidate {
    turnpoints: [usize; 3],
    df: u32,
}

/// State of the branch-and-bound run, kept while it is suspended.
#[derive(Debug, Clone, Default)]
struct BranchAndBound {
    tree: BTreeMap<(u32, u64), CandidateSet>,
    sequence: u64,
    iterations: usize,
    worst_d: u32,
    best: Option<BnbCandidate>,
    running: bool,
}

impl BranchAndBound {
    fn reset(&mut self) {
        *self = BranchAndBound::default();
    }

    fn insert(&mut self, candidate: CandidateSet) {
        self.tree.insert((candidate.df_max, self.sequence), candidate);
        self.sequence += 1;
    }

    fn check_add(&mut self, candidate: CandidateSet, validator: &TriangleValidator) {
        if candidate.df_max >= self.worst_d && candidate.is_feasible(validator) {
            self.insert(candidate);
        }
    }

    /// Key of the node to expand next.
    ///
    /// Normally the node with the largest bound (the newest on ties). Once the tree grows
    /// beyond `4n` nodes, fifteen of sixteen iterations take the node just above half of
    /// the largest bound, which keeps the tree small.
    fn select(&self, n_points: usize) -> Option<(u32, u64)> {
        let (&last, _) = self.tree.last_key_value()?;
        if self.tree.len() > n_points * 4 && self.iterations % 16 != 0 {
            let half = last.0 / 2;
            let key = self
                .tree
                .range((Excluded((half, u64::MAX)), Unbounded))
                .next()
                .map(|(key, _)| *key)
                .unwrap_or(last);
            Some(key)
        } else {
            Some(last)
        }
    }
}

/// Closed-triangle search over a private snapshot of the trace.
#[derive(Debug, Clone)]
pub struct TriangleSolver {
    config: TriangleSolverConfig,
    tuning: TriangleTuning,
    snapshot: TraceManager,
    incremental: bool,

    closing_pairs: ClosingPairs,
    quad_tree: QuadTree<usize>,
    quad_tree_serial: Option<Serial>,

    bnb: BranchAndBound,
    tick_iterations: usize,

    best_d: u32,
    is_closed: bool,
    is_complete: bool,

    solution: Option<TriangleSolution>,
    counters: SolveCounters,
}

impl TriangleSolver {
    pub fn new(config: TriangleSolverConfig) -> Self {
        TriangleSolver {
            config,
            tuning: TriangleTuning::default(),
            snapshot: TraceManager::new(),
            incremental: false,
            closing_pairs: ClosingPairs::new(),
            quad_tree: QuadTree::new(),
            quad_tree_serial: None,
            bnb: BranchAndBound::default(),
            tick_iterations: 1000,
            best_d: 0,
            is_closed: false,
            is_complete: false,
            solution: None,
            counters: SolveCounters::new(),
        }
    }

    pub fn config(&self) -> &TriangleSolverConfig {
        &self.config
    }

    pub fn set_tuning(&mut self, tuning: TriangleTuning) {
        self.tuning = tuning;
    }

    pub fn set_incremental(&mut self, incremental: bool) {
        self.incremental = incremental;
    }

    pub fn counters(&self) -> SolveCounters {
        self.counters
    }

    /// `true` while a suspended branch-and-bound run is waiting for the next tick.
    pub fn is_running(&self) -> bool {
        self.bnb.running
    }

    pub fn closing_pairs(&self) -> &ClosingPairs {
        &self.closing_pairs
    }

    /// Best triangle found since the last full resync.
    pub fn solution(&self) -> Option<&TriangleSolution> {
        self.solution.as_ref()
    }

    pub fn reset(&mut self) {
        self.is_complete = false;
        self.is_closed = false;
        self.best_d = 0;
        self.tick_iterations = 1000;
        self.closing_pairs.clear();
        self.quad_tree.clear();
        self.quad_tree_serial = None;
        self.snapshot.clear();
        self.bnb.reset();
        self.solution = None;
        self.counters = SolveCounters::new();
    }

    /// Run (or continue) the search.
    ///
    /// Return
    /// ----------
    /// * [`SolverResult::Valid`] when a triangle was found and the search is done.
    /// * [`SolverResult::Incomplete`] while a suspended predictive run is in progress.
    /// * [`SolverResult::Failed`] with fewer than three points, without closed loops, or when
    ///   there is nothing new to search.
    pub fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult {
        self.counters.solves += 1;

        if trace.len() < 3 {
            self.snapshot.clear();
            self.is_complete = false;
            self.bnb.reset();
            return SolverResult::Failed;
        }

        if !self.bnb.running {
            self.update_trace(trace, exhaustive);
        }

        if self.is_complete && !self.bnb.running {
            return SolverResult::Failed;
        }

        if self.snapshot.len() < 3 {
            self.bnb.reset();
            return SolverResult::Failed;
        }

        let found = self.is_closed && self.solve_triangle(trace, exhaustive);

        if self.bnb.running {
            return SolverResult::Incomplete;
        }
        if found || self.is_complete {
            SolverResult::Valid
        } else {
            SolverResult::Failed
        }
    }

    fn update_trace(&mut self, trace: &Trace, force: bool) {
        if !self.snapshot.is_appended(trace) && !self.snapshot.is_modified(trace) {
            return;
        }

        if force || self.snapshot.is_master_updated(trace, false, 3) {
            self.snapshot.update_full(trace);
            self.counters.full_resyncs += 1;

            self.is_complete = false;
            self.best_d = 0;
            self.solution = None;
            self.closing_pairs.clear();
            self.is_closed = self.find_closing_pairs(trace, 0);

            debug!(
                points = self.snapshot.len(),
                closing_pairs = self.closing_pairs.len(),
                "triangle solver full resync"
            );
        } else if self.is_complete && self.incremental && !self.snapshot.is_modified(trace) {
            let old_size = self.snapshot.len();
            if self.snapshot.update_tail(trace) {
                self.counters.tail_resyncs += 1;
                if self.find_closing_pairs(trace, old_size) {
                    self.is_complete = false;
                    self.is_closed = true;
                }
            }
        }

        let n = self.snapshot.len();
        self.tick_iterations = (n * n / self.tuning.tick_iteration_divisor.max(1)).max(1);
    }

    /// Add the closing pairs involving points from `old_size` on.
    ///
    /// Return
    /// ----------
    /// * `true` if at least one new pair was stored.
    fn find_closing_pairs(&mut self, trace: &Trace, old_size: usize) -> bool {
        let n = self.snapshot.len();
        if self.config.predict {
            return n >= 3 && self.closing_pairs.insert(ClosingPair::new(0, n - 1));
        }

        let points = self.snapshot.points();

        if self.quad_tree_serial != Some(trace.modify_serial()) || self.quad_tree.len() > n {
            self.quad_tree.clear();
        }
        for (index, point) in points.iter().enumerate().skip(self.quad_tree.len()) {
            self.quad_tree.insert(point.flat_location, index);
        }
        self.quad_tree_serial = Some(trace.modify_serial());

        let finish_alt_diff = self.config.finish_alt_diff as i32;
        let mut new_pair = false;

        for (i, point) in points.iter().enumerate().skip(old_size) {
            let max_range = trace.project_range(&point.location, MAX_CLOSING_DISTANCE);
            let half_max_range_sq = u64::from(max_range) * u64::from(max_range) / 2;
            let in_range = |other: &TracePoint| {
                point.flat_location.distance_squared(&other.flat_location) <= half_max_range_sq
                    || point.distance(other) <= MAX_CLOSING_DISTANCE
            };

            let min_altitude = point.integer_altitude() - finish_alt_diff;
            let max_altitude = point.integer_altitude() + finish_alt_diff;

            let mut earliest: Option<usize> = None;
            let mut latest: Option<usize> = None;

            self.quad_tree.visit_within_range(&point.flat_location, max_range, |_, &j| {
                let other = &points[j];
                if j + 2 < i && other.integer_altitude() <= max_altitude && in_range(other) {
                    // point i finishes a loop started at j
                    earliest = Some(earliest.map_or(j, |e| e.min(j)));
                } else if j > i + 2 && other.integer_altitude() >= min_altitude && in_range(other) {
                    // point i starts a loop finished at j
                    latest = Some(latest.map_or(j, |l| l.max(j)));
                }
            });

            if let Some(first) = earliest {
                new_pair |= self.closing_pairs.insert(ClosingPair::new(first, i));
            }
            if let Some(last) = latest {
                new_pair |= self.closing_pairs.insert(ClosingPair::new(i, last));
            }
        }

        new_pair
    }

    /// Search the closing pairs for a better triangle.
    ///
    /// Return
    /// ----------
    /// * `true` if a better triangle was stored in `solution`.
    fn solve_triangle(&mut self, trace: &Trace, exhaustive: bool) -> bool {
        let n = self.snapshot.len();
        let mut best: Option<(ClosingPair, [usize; 3])> = None;

        if exhaustive || !self.config.predict {
            let relaxed_pairs = self.relaxed_pairs(n);
            let mut close_look = ClosingPairs::new();

            for relaxed in relaxed_pairs.iter() {
                self.bnb.reset();
                let Some(candidate) = self.run_branch_and_bound(trace, relaxed, exhaustive) else {
                    continue;
                };
                if candidate.df <= self.best_d {
                    continue;
                }

                let [tp1, _, tp3] = candidate.turnpoints;
                match self.closing_pairs.find_range(ClosingPair::new(tp1, tp3)) {
                    Some(exact) => {
                        best = Some((exact, candidate.turnpoints));
                        self.best_d = candidate.df;
                    }
                    None => {
                        for exact in self.closing_pairs.iter().filter(|pair| relaxed.contains(pair)) {
                            close_look.insert(exact);
                        }
                    }
                }
            }

            for exact in close_look.iter() {
                self.bnb.reset();
                if let Some(candidate) = self.run_branch_and_bound(trace, exact, exhaustive) {
                    if candidate.df > self.best_d {
                        best = Some((exact, candidate.turnpoints));
                        self.best_d = candidate.df;
                    }
                }
            }

            self.bnb.reset();
        } else {
            let pair = ClosingPair::new(0, n - 1);
            if let Some(candidate) = self.run_branch_and_bound(trace, pair, false) {
                if candidate.df > self.best_d {
                    best = Some((pair, candidate.turnpoints));
                    self.best_d = candidate.df;
                }
            }
        }

        let Some((pair, [tp1, tp2, tp3])) = best else {
            return false;
        };

        let points = self.snapshot.points();
        let vertices: ContestTraceVector = [pair.first, tp1, tp2, tp3, pair.last]
            .iter()
            .map(|&i| points[i])
            .collect();
        let solution = TriangleSolution::new(vertices);

        debug!(
            best_d = self.best_d,
            distance = solution.distance,
            gap = solution.gap,
            "triangle improved"
        );

        self.solution = Some(solution);
        self.is_complete = true;
        true
    }

    /// Merge consecutive closing pairs whose endpoints lie within the relax distance.
    fn relaxed_pairs(&self, n: usize) -> ClosingPairs {
        let relax = (n as f64 * self.tuning.relax_ratio) as usize;
        let pairs: Vec<ClosingPair> = self.closing_pairs.iter().collect();
        let mut relaxed_pairs = ClosingPairs::new();

        for (k, pair) in pairs.iter().enumerate() {
            if relaxed_pairs.find_range(*pair).is_some() {
                continue;
            }

            let max_first = pair.first + relax;
            let max_last = pair.last + relax;
            let relax_last = pairs[k + 1..]
                .iter()
                .take_while(|next| next.first <= max_first && next.last <= max_last)
                .fold(pair.last, |last, next| last.max(next.last));

            relaxed_pairs.insert(ClosingPair::new(pair.first, relax_last));
        }
        relaxed_pairs
    }

    /// Run (or resume) branch and bound with turnpoints in `[pair.first, pair.last]`.
    ///
    /// Return
    /// ----------
    /// * The best integral candidate of the run so far, if any.
    fn run_branch_and_bound(&mut self, trace: &Trace, pair: ClosingPair, exhaustive: bool) -> Option<BnbCandidate> {
        let points = self.snapshot.points();
        let from_location = points[pair.first].location;
        let validator = TriangleValidator::new(self.config.rules, trace.projection(), &from_location);

        if !self.bnb.running {
            // not even a straight flight at top speed could beat the best perimeter
            let duration = points[pair.last].delta_time(&points[pair.first]);
            let fast_skip_range = trace.project_range(&from_location, f64::from(duration) * MAX_GROUND_SPEED);
            if fast_skip_range < self.best_d {
                return None;
            }

            self.bnb.reset();
            self.bnb.running = true;
            self.bnb.worst_d = self.best_d;

            let root = CandidateSet::root(points, pair.first, pair.last, &validator);
            if root.is_feasible(&validator) && root.df_max >= self.bnb.worst_d {
                self.bnb.insert(root);
            }
        }

        let quota = if !exhaustive && self.config.predict {
            self.tick_iterations
        } else {
            self.tuning.max_iterations
        };

        let n = points.len();
        let mut tick = 0;
        let mut abandoned = false;

        while !self.bnb.tree.is_empty() {
            if self.bnb.iterations >= self.tuning.max_iterations || self.bnb.tree.len() > self.tuning.max_tree_size {
                abandoned = true;
                break;
            }
            if tick >= quota {
                break;
            }
            tick += 1;
            self.bnb.iterations += 1;

            let worst = (self.bnb.worst_d, 0);
            self.bnb.tree = self.bnb.tree.split_off(&worst);

            let Some(key) = self.bnb.select(n) else {
                break;
            };
            let Some(node) = self.bnb.tree.remove(&key) else {
                break;
            };

            if node.df_min >= self.bnb.worst_d && node.is_integral(points, &validator) {
                self.bnb.worst_d = node.df_min;
                self.bnb.best = Some(BnbCandidate {
                    turnpoints: node.sorted_turnpoints(),
                    df: key.0,
                });
            } else {
                Self::branch(&mut self.bnb, points, &node, &validator);
            }
        }

        self.counters.bnb_iterations += tick as u64;
        self.counters.record_tree_size(self.bnb.tree.len());

        if self.bnb.tree.is_empty() || abandoned {
            trace!(
                iterations = self.bnb.iterations,
                abandoned,
                first = pair.first,
                last = pair.last,
                "branch and bound finished"
            );
            self.bnb.running = false;
            self.bnb.tree.clear();
        } else {
            trace!(
                iterations = self.bnb.iterations,
                tree_size = self.bnb.tree.len(),
                "branch and bound suspended"
            );
        }

        self.bnb.best
    }

    /// Split the range with the largest diagonal and queue the feasible halves.
    fn branch(bnb: &mut BranchAndBound, points: &[TracePoint], node: &CandidateSet, validator: &TriangleValidator) {
        let [tp1, tp2, tp3] = node.tp;
        let max_diag = tp1.diagonal().max(tp2.diagonal()).max(tp3.diagonal());

        if tp1.diagonal() == max_diag && tp1.size() != 1 {
            let (split, halves) = tp1.split(points);
            if split <= tp2.index_max {
                for half in halves {
                    bnb.check_add(CandidateSet::new([half, tp2, tp3], validator), validator);
                }
            }
        } else if tp2.diagonal() == max_diag && tp2.size() != 1 {
            let (split, halves) = tp2.split(points);
            if split <= tp3.index_max && split >= tp1.index_min {
                for half in halves {
                    bnb.check_add(CandidateSet::new([tp1, half, tp3], validator), validator);
                }
            }
        } else if tp3.size() != 1 {
            let (split, halves) = tp3.split(points);
            if split >= tp2.index_min {
                for half in halves {
                    bnb.check_add(CandidateSet::new([tp1, tp2, half], validator), validator);
                }
            }
        }
    }
}
