//! # Path solver
//!
//! Finds the path through the trace with the largest weighted distance, for rulesets made
//! of a start, a fixed number of turnpoints and a finish (free distance, out-and-return,
//! quadrilateral, sprint).
//!
//! ## Graph
//!
//! Stage `s` of the search picks the point of vertex `s`. Node `(s, i)` links to every
//! `(s + 1, j)` with `j ≥ i`; the edge weight is the flat distance between the two points
//! times the stage weight (in fifths, so `5` is the unit weight). The final stage adds
//! the ruleset constraints:
//!
//! * the finish must not be more than `finish_alt_diff` below the start actually used;
//! * optionally, the finish must lie within `max_closing_distance` of that start.
//!
//! ## Incremental operation
//!
//! In incremental mode start candidates are restricted to points low enough to be valid
//! for a finish at the newest point, and the finish to the newest point itself. Continuous
//! rulesets then keep the edge map after a completed search: when new points arrive only
//! the edges from retained nodes to the new points are added, and the search resumes.
//!
//! ## Budget
//!
//! A non-exhaustive call expands at most `tick_budget` nodes and returns
//! [`SolverResult::Incomplete`] when the search is not done yet.

use tracing::debug;

use crate::{
    constants::{Meter, Second, DEFAULT_FINISH_ALT_DIFF, DIJKSTRA_TICK_BUDGET, MAX_STAGES, UNIT_STAGE_WEIGHT},
    contest::result::ContestTraceVector,
    counters::SolveCounters,
    trace::{Fix, Trace, TraceManager, TracePoint},
};

use super::{
    dijkstra::{Dijkstra, NavDijkstra, ScanTaskPoint, SearchOrder},
    SolverResult,
};

/// Shape constraints of a path ruleset.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSolverConfig {
    pub num_legs: usize,
    /// Keep the edge map between ticks and extend it with new points
    pub continuous: bool,
    /// Maximum altitude loss between start and finish, in meters
    pub finish_alt_diff: u32,
    /// Weight of each leg in fifths
    pub stage_weights: Vec<u32>,
    /// Legs shorter than this are never linked
    pub min_leg_distance: Option<Meter>,
    /// The finish must lie within this distance of the start
    pub max_closing_distance: Option<Meter>,
    /// Only points of the last N seconds are candidates
    pub time_window: Option<Second>,
    /// The finish is always the newest point
    pub finish_at_last_point: bool,
}

impl PathSolverConfig {
    /// Panics
    /// ----------
    /// * If `num_legs + 1` exceeds [`MAX_STAGES`].
    pub fn new(num_legs: usize) -> Self {
        assert!(num_legs >= 1 && num_legs < MAX_STAGES, "unsupported leg count {num_legs}");
        PathSolverConfig {
            num_legs,
            continuous: false,
            finish_alt_diff: DEFAULT_FINISH_ALT_DIFF,
            stage_weights: vec![UNIT_STAGE_WEIGHT; num_legs],
            min_leg_distance: None,
            max_closing_distance: None,
            time_window: None,
            finish_at_last_point: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn finish_alt_diff(mut self, finish_alt_diff: u32) -> Self {
        self.finish_alt_diff = finish_alt_diff;
        self
    }

    /// Weights for the first legs; legs beyond `weights.len()` keep the unit weight.
    pub fn stage_weights(mut self, weights: &[u32]) -> Self {
        for (slot, &weight) in self.stage_weights.iter_mut().zip(weights) {
            *slot = weight;
        }
        self
    }

    pub fn min_leg_distance(mut self, distance: Meter) -> Self {
        self.min_leg_distance = Some(distance);
        self
    }

    pub fn max_closing_distance(mut self, distance: Meter) -> Self {
        self.max_closing_distance = Some(distance);
        self
    }

    pub fn time_window(mut self, window: Second) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn finish_at_last_point(mut self, enabled: bool) -> Self {
        self.finish_at_last_point = enabled;
        self
    }

    pub fn num_stages(&self) -> usize {
        self.num_legs + 1
    }
}

/// Best path of one completed search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSolution {
    pub points: ContestTraceVector,
    /// Sum of the geodesic leg lengths
    pub distance: Meter,
    /// Sum of the geodesic leg lengths times their stage weights
    pub weighted_distance: Meter,
    pub time: Second,
}

/// Read-only view of the snapshot used to generate edges.
struct EdgeBuilder<'a> {
    points: &'a [TracePoint],
    config: &'a PathSolverConfig,
    first_point: usize,
    first_finish_candidate: usize,
}

impl EdgeBuilder<'_> {
    fn is_final(&self, node: ScanTaskPoint) -> bool {
        node.stage + 1 == self.config.num_stages()
    }

    fn min_finish_altitude(&self, start: &TracePoint) -> i32 {
        start.integer_altitude() - self.config.finish_alt_diff as i32
    }

    fn max_start_altitude(&self, finish: &TracePoint) -> i32 {
        finish.integer_altitude() + self.config.finish_alt_diff as i32
    }

    fn add_start_edges(&self, dijkstra: &mut Dijkstra, incremental: bool) {
        let Some(last) = self.points.last() else {
            return;
        };
        let max_altitude = self.max_start_altitude(last);

        for (index, point) in self.points.iter().enumerate().skip(self.first_point) {
            if !incremental || point.integer_altitude() <= max_altitude {
                dijkstra.link_start(ScanTaskPoint::new(0, index));
            }
        }
    }

    /// Link `origin` to every admissible point of the next stage at or after `first_point`.
    fn add_edges(&self, dijkstra: &mut Dijkstra, origin: ScanTaskPoint, first_point: usize) {
        let stage = origin.stage + 1;
        let mut first = origin.index.max(first_point).max(self.first_point);

        let is_final = self.is_final(ScanTaskPoint::new(stage, first));
        let start = is_final.then(|| self.points[dijkstra.find_start(origin).index]);

        if is_final {
            // limits the finish candidates in incremental mode
            first = first.max(self.first_finish_candidate);
        }

        let min_altitude = start.as_ref().map(|s| self.min_finish_altitude(s));
        let weight = u64::from(self.config.stage_weights[origin.stage]);
        let from = &self.points[origin.index];

        for (index, point) in self.points.iter().enumerate().skip(first) {
            if let (Some(start), Some(min_altitude)) = (start.as_ref(), min_altitude) {
                if point.integer_altitude() < min_altitude {
                    continue;
                }
                if let Some(max_close) = self.config.max_closing_distance {
                    if start.distance(point) > max_close {
                        continue;
                    }
                }
            }
            if let Some(min_leg) = self.config.min_leg_distance {
                if from.distance(point) < min_leg {
                    continue;
                }
            }

            let d = u64::from(from.flat_distance_to(point));
            dijkstra.link(ScanTaskPoint::new(stage, index), origin, weight * d);
        }
    }
}

/// Multi-stage path search over a private snapshot of the trace.
#[derive(Debug, Clone)]
pub struct PathSolver {
    config: PathSolverConfig,
    nav: NavDijkstra,
    snapshot: TraceManager,
    /// Predicted finish, projected afresh on every snapshot update
    predicted: Option<Fix>,

    incremental: bool,
    tick_budget: usize,

    trace_dirty: bool,
    finished: bool,
    first_point: usize,
    first_finish_candidate: usize,

    solution: Option<PathSolution>,
    counters: SolveCounters,
}

impl PathSolver {
    pub fn new(config: PathSolverConfig) -> Self {
        let nav = NavDijkstra::new(config.num_stages(), SearchOrder::Maximize);
        PathSolver {
            config,
            nav,
            snapshot: TraceManager::new(),
            predicted: None,
            incremental: false,
            tick_budget: DIJKSTRA_TICK_BUDGET,
            trace_dirty: true,
            finished: false,
            first_point: 0,
            first_finish_candidate: 0,
            solution: None,
            counters: SolveCounters::new(),
        }
    }

    pub fn config(&self) -> &PathSolverConfig {
        &self.config
    }

    pub fn num_stages(&self) -> usize {
        self.nav.num_stages()
    }

    pub fn counters(&self) -> SolveCounters {
        self.counters
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    /// Switch incremental mode; the next solve starts from scratch.
    pub fn set_incremental(&mut self, incremental: bool) {
        if self.incremental != incremental {
            self.incremental = incremental;
            self.reset();
        }
    }

    pub fn set_tick_budget(&mut self, budget: usize) {
        self.tick_budget = budget.max(1);
    }

    /// Install or remove the predicted finish point.
    ///
    /// A changed prediction discards the running search.
    ///
    /// Return
    /// ----------
    /// * `true` if the prediction changed.
    pub fn set_predicted(&mut self, predicted: Option<Fix>) -> bool {
        if self.predicted == predicted {
            return false;
        }
        self.predicted = predicted;
        self.nav.dijkstra.clear();
        self.clear_trace();
        true
    }

    pub fn predicted(&self) -> Option<&Fix> {
        self.predicted.as_ref()
    }

    /// Solution of the last search that reached the final stage.
    pub fn solution(&self) -> Option<&PathSolution> {
        self.solution.as_ref()
    }

    pub fn reset(&mut self) {
        self.nav.dijkstra.clear();
        self.solution = None;
        self.counters = SolveCounters::new();
        self.clear_trace();
    }

    fn clear_trace(&mut self) {
        self.snapshot.clear();
        self.trace_dirty = true;
        self.finished = false;
        self.first_point = 0;
        self.first_finish_candidate = 0;
    }

    /// Run (or continue) the search.
    ///
    /// Return
    /// ----------
    /// * [`SolverResult::Valid`] when a search completed with a solution this call.
    /// * [`SolverResult::Incomplete`] when the tick budget ran out.
    /// * [`SolverResult::Failed`] when there is too little data, nothing new to search, or no
    ///   admissible path.
    pub fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult {
        self.counters.solves += 1;
        let num_stages = self.num_stages();

        if trace.len() < num_stages {
            self.clear_trace();
            return SolverResult::Failed;
        }

        if self.finished || self.nav.dijkstra.is_empty() {
            let was_finished = self.finished;
            self.update_trace(trace, exhaustive);

            if self.snapshot.len() < num_stages {
                return SolverResult::Failed;
            }
            // nothing new since the last completed search
            if !self.trace_dirty && (self.finished || !was_finished) {
                return SolverResult::Failed;
            }
        } else if exhaustive || self.snapshot.len() < num_stages || self.snapshot.is_modified(trace) {
            self.update_trace(trace, exhaustive);
            if self.snapshot.len() < num_stages {
                return SolverResult::Failed;
            }
        }

        if self.trace_dirty {
            self.trace_dirty = false;
            self.finished = false;

            self.nav.dijkstra.clear();
            let builder = EdgeBuilder {
                points: self.snapshot.points(),
                config: &self.config,
                first_point: self.first_point,
                first_finish_candidate: self.first_finish_candidate,
            };
            builder.add_start_edges(&mut self.nav.dijkstra, self.incremental);
            if self.nav.dijkstra.is_empty() {
                return SolverResult::Failed;
            }
        }

        let budget = if exhaustive { None } else { Some(self.tick_budget) };
        let builder = EdgeBuilder {
            points: self.snapshot.points(),
            config: &self.config,
            first_point: self.first_point,
            first_finish_candidate: self.first_finish_candidate,
        };
        let (result, expansions) = self
            .nav
            .distance_general(budget, |dijkstra, origin| builder.add_edges(dijkstra, origin, 0));
        self.counters.relaxations += expansions as u64;

        if result == SolverResult::Incomplete {
            return result;
        }

        if self.incremental && self.config.continuous {
            // keep the edge map for the incremental search
            self.finished = true;
        } else {
            self.nav.dijkstra.clear();
        }

        if result == SolverResult::Valid {
            self.save_solution();
        }

        self.update_trace(trace, false);
        result
    }

    fn save_solution(&mut self) {
        let solution = self.nav.solution();
        let points: ContestTraceVector = solution.iter().map(|&i| *self.snapshot.point(i)).collect();

        let mut distance = 0.0;
        let mut weighted_distance = 0.0;
        for (leg, pair) in points.windows(2).enumerate() {
            let d = pair[0].distance(&pair[1]);
            distance += d;
            weighted_distance += d * f64::from(self.config.stage_weights[leg]) / f64::from(UNIT_STAGE_WEIGHT);
        }

        let time = match (points.first(), points.last()) {
            (Some(start), Some(finish)) => finish.delta_time(start),
            _ => 0,
        };

        debug!(
            legs = self.config.num_legs,
            distance, weighted_distance, time, "path search completed"
        );

        self.solution = Some(PathSolution {
            points,
            distance,
            weighted_distance,
            time,
        });
    }

    /// Bring the snapshot up to date with the store.
    ///
    /// Only incremental continuous searches extend their snapshot tail; every other search
    /// rebuilds it once the new points are significant. With `force` any new point triggers
    /// a full resync.
    fn update_trace(&mut self, trace: &Trace, force: bool) {
        // a moved projection origin shows up as a changed prediction and forces a resync
        let predicted = self.predicted.map(|fix| TracePoint::from_fix(&fix, trace.projection()));
        self.snapshot.set_predicted(predicted);

        let appended = self.snapshot.is_appended(trace);
        let tail_blocked = self.snapshot.predicted().is_some() && appended;
        let tail_only = self.config.continuous && self.incremental;

        if !(force && appended)
            && !tail_blocked
            && !self.snapshot.is_master_updated(trace, tail_only, self.num_stages())
        {
            if self.finished && self.snapshot.is_appended(trace) {
                let old_size = self.snapshot.len();
                if self.snapshot.update_tail(trace) {
                    self.counters.tail_resyncs += 1;
                    self.add_incremental_edges(old_size);
                }
            }
            return;
        }

        self.snapshot.update_full(trace);
        self.counters.full_resyncs += 1;
        self.trace_dirty = true;
        self.finished = false;

        let n = self.snapshot.len();
        self.first_point = match (self.config.time_window, self.snapshot.last()) {
            (Some(window), Some(last)) => {
                let min_time = last.time.saturating_sub(window);
                self.snapshot.points().partition_point(|point| point.time < min_time)
            }
            _ => 0,
        };
        self.first_finish_candidate = if self.incremental || self.config.finish_at_last_point {
            n.saturating_sub(1)
        } else {
            0
        };

        debug!(points = n, first_point = self.first_point, "path solver full resync");
    }

    /// Link every retained non-final node to the points from `first_point` on.
    fn add_incremental_edges(&mut self, first_point: usize) {
        debug_assert!(self.config.continuous && self.incremental);

        self.finished = false;
        self.first_finish_candidate = first_point;

        let retained: Vec<(ScanTaskPoint, u64)> = self
            .nav
            .dijkstra
            .edges()
            .iter()
            .filter(|(node, _)| !self.nav.is_final(**node))
            .map(|(node, edge)| (*node, edge.cost))
            .collect();

        let builder = EdgeBuilder {
            points: self.snapshot.points(),
            config: &self.config,
            first_point: self.first_point,
            first_finish_candidate: self.first_finish_candidate,
        };

        for (node, cost) in retained {
            // seek to the retained node as if it had just been popped
            self.nav.dijkstra.set_current_value(cost);
            builder.add_edges(&mut self.nav.dijkstra, node, first_point);
        }

        // a lower finish may have opened new start candidates
        builder.add_start_edges(&mut self.nav.dijkstra, true);
    }
}
