//! # Scoring policies
//!
//! Each policy turns the output of a search into a [`ContestResult`] and keeps its best one.
//!
//! ## Overview
//!
//! | Policy | Input | Score |
//! |---|---|---|
//! | [`PathContest`] | [`PathSolver`] | weighted km × points/km × (1 + bonus) [/ hours] |
//! | [`TriangleContest`] | [`TriangleSolver`] | perimeter km (− gap) × points/km × (1 + bonus) |
//! | [`LeagueContest`] | trace + a fed path | km in the last 2.5 h / 2.5 |
//! | [`CompositeContest`] | fed component results | see [`CompositeRule`] |
//!
//! Results below a policy's `min_score` are discarded. All scores go through the policy's
//! handicap, except composite sums and picks whose inputs are already handicapped.
//!
//! [`ContestPolicy`] closes the set so the manager can wire policies together without
//! dynamic dispatch.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::debug;

use crate::{
    constants::{Second, MAX_GAP_RATIO, METERS_PER_KM, NEUTRAL_HANDICAP, SPRINT_HOURS, SPRINT_WINDOW},
    counters::SolveCounters,
    solvers::{PathSolution, PathSolver, SolverResult, TriangleSolution, TriangleSolver, TriangleTuning},
    trace::{Fix, Trace, TracePoint},
};

use super::{
    result::{ContestResult, ContestTraceVector},
    scoring::{apply_handicap, apply_shifted_handicap, effective_handicap, Contest, ContestBest},
};

/// Number of intermediate points of a league flight.
const LEAGUE_TURNPOINTS: usize = 3;

// -------------------------------------------------------------------------------------------------
// Path policies
// -------------------------------------------------------------------------------------------------

/// Distance-to-score mapping of path rulesets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathScoring {
    pub points_per_km: f64,
    /// Additive bonus, `0.3` for +30 %
    pub bonus: f64,
    /// Results scoring less are discarded
    pub min_score: f64,
    /// Use the shifted handicap formula
    pub shifted: bool,
    /// Divide by this duration to score a speed
    pub sprint_hours: Option<f64>,
}

impl Default for PathScoring {
    fn default() -> Self {
        PathScoring {
            points_per_km: 1.0,
            bonus: 0.0,
            min_score: 0.0,
            shifted: false,
            sprint_hours: None,
        }
    }
}

impl PathScoring {
    pub fn new(points_per_km: f64) -> Self {
        PathScoring {
            points_per_km,
            ..Self::default()
        }
    }

    pub fn bonus(mut self, bonus: f64) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Score the average speed over `hours` with the shifted handicap.
    pub fn sprint(mut self, hours: f64) -> Self {
        self.shifted = true;
        self.sprint_hours = Some(hours);
        self
    }

    /// Return
    /// ----------
    /// * The scored result, or an undefined one when below `min_score`.
    pub fn result(&self, solution: &PathSolution, handicap: u32) -> ContestResult {
        let mut value = solution.weighted_distance / METERS_PER_KM * self.points_per_km * (1.0 + self.bonus);
        if let Some(hours) = self.sprint_hours {
            value /= hours;
        }
        let score = if self.shifted {
            apply_shifted_handicap(value, handicap)
        } else {
            apply_handicap(value, handicap)
        };

        if score < self.min_score {
            return ContestResult::default();
        }
        ContestResult::new(score, solution.distance, solution.time)
    }
}

/// Path search scored by a [`PathScoring`].
#[derive(Debug, Clone)]
pub struct PathContest {
    solver: PathSolver,
    scoring: PathScoring,
    handicap: u32,
    best: ContestBest,
}

impl PathContest {
    pub fn new(solver: PathSolver, scoring: PathScoring) -> Self {
        PathContest {
            solver,
            scoring,
            handicap: NEUTRAL_HANDICAP,
            best: ContestBest::new(),
        }
    }

    pub fn solver(&self) -> &PathSolver {
        &self.solver
    }

    pub fn scoring(&self) -> &PathScoring {
        &self.scoring
    }

    /// Install or remove the predicted finish point.
    ///
    /// The best result of a preview is not a lower bound for the next one, so a changed
    /// prediction also forgets the best result.
    ///
    /// Return
    /// ----------
    /// * `true` if the prediction changed.
    pub fn set_predicted(&mut self, predicted: Option<Fix>) -> bool {
        if !self.solver.set_predicted(predicted) {
            return false;
        }
        self.best.reset();
        true
    }
}

impl Contest for PathContest {
    fn reset(&mut self) {
        self.solver.reset();
        self.best.reset();
    }

    fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult {
        let result = self.solver.solve(trace, exhaustive);
        if result == SolverResult::Valid {
            if let Some(solution) = self.solver.solution() {
                let scored = self.scoring.result(solution, self.handicap);
                if self.best.update(scored, &solution.points) {
                    debug!(score = scored.score, distance = scored.distance, "path result improved");
                }
            }
        }
        result
    }

    fn best_result(&self) -> ContestResult {
        self.best.result()
    }

    fn best_solution(&self) -> &[TracePoint] {
        self.best.solution()
    }

    fn set_handicap(&mut self, handicap: u32) {
        let handicap = effective_handicap(handicap);
        if self.handicap != handicap {
            self.handicap = handicap;
            self.reset();
        }
    }

    fn set_incremental(&mut self, incremental: bool) {
        self.solver.set_incremental(incremental);
    }

    fn counters(&self) -> SolveCounters {
        self.solver.counters()
    }
}

// -------------------------------------------------------------------------------------------------
// Triangle policies
// -------------------------------------------------------------------------------------------------

/// Distance-to-score mapping of triangle rulesets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleScoring {
    pub points_per_km: f64,
    pub bonus: f64,
    pub min_score: f64,
    /// Subtract the start/finish gap and reject gaps above 20 % of the perimeter
    pub gap_penalty: bool,
}

impl Default for TriangleScoring {
    fn default() -> Self {
        TriangleScoring {
            points_per_km: 1.0,
            bonus: 0.0,
            min_score: 0.0,
            gap_penalty: false,
        }
    }
}

impl TriangleScoring {
    pub fn new(points_per_km: f64) -> Self {
        TriangleScoring {
            points_per_km,
            ..Self::default()
        }
    }

    pub fn bonus(mut self, bonus: f64) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn gap_penalty(mut self, gap_penalty: bool) -> Self {
        self.gap_penalty = gap_penalty;
        self
    }

    pub fn result(&self, solution: &TriangleSolution, handicap: u32) -> ContestResult {
        let mut distance = solution.distance;
        if self.gap_penalty {
            if solution.gap > MAX_GAP_RATIO * distance {
                return ContestResult::default();
            }
            distance -= solution.gap;
        }

        let score = apply_handicap(
            distance / METERS_PER_KM * self.points_per_km * (1.0 + self.bonus),
            handicap,
        );
        if score < self.min_score {
            return ContestResult::default();
        }
        ContestResult::new(score, distance, solution.time)
    }
}

/// Triangle search scored by a [`TriangleScoring`].
#[derive(Debug, Clone)]
pub struct TriangleContest {
    solver: TriangleSolver,
    scoring: TriangleScoring,
    handicap: u32,
    best: ContestBest,
}

impl TriangleContest {
    pub fn new(solver: TriangleSolver, scoring: TriangleScoring) -> Self {
        TriangleContest {
            solver,
            scoring,
            handicap: NEUTRAL_HANDICAP,
            best: ContestBest::new(),
        }
    }

    pub fn solver(&self) -> &TriangleSolver {
        &self.solver
    }

    pub fn scoring(&self) -> &TriangleScoring {
        &self.scoring
    }

    pub fn set_tuning(&mut self, tuning: TriangleTuning) {
        self.solver.set_tuning(tuning);
    }
}

impl Contest for TriangleContest {
    fn reset(&mut self) {
        self.solver.reset();
        self.best.reset();
    }

    fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult {
        let result = self.solver.solve(trace, exhaustive);
        // suspended predictive runs already publish their intermediate best
        if result != SolverResult::Failed {
            if let Some(solution) = self.solver.solution() {
                let scored = self.scoring.result(solution, self.handicap);
                if self.best.update(scored, &solution.points) {
                    debug!(score = scored.score, distance = scored.distance, "triangle result improved");
                }
            }
        }
        result
    }

    fn best_result(&self) -> ContestResult {
        self.best.result()
    }

    fn best_solution(&self) -> &[TracePoint] {
        self.best.solution()
    }

    fn set_handicap(&mut self, handicap: u32) {
        let handicap = effective_handicap(handicap);
        if self.handicap != handicap {
            self.handicap = handicap;
            self.reset();
        }
    }

    fn set_incremental(&mut self, incremental: bool) {
        self.solver.set_incremental(incremental);
    }

    fn counters(&self) -> SolveCounters {
        self.solver.counters()
    }
}

// -------------------------------------------------------------------------------------------------
// League
// -------------------------------------------------------------------------------------------------

/// Speed flight over the last 2.5 hours, through points of a fed classic path.
///
/// The start is the first trace point of the window and the finish the newest point, which
/// must not be lower than the start. Up to three points of the fed path lying strictly
/// between them become the intermediate points; missing ones repeat the previous point.
#[derive(Debug, Clone)]
pub struct LeagueContest {
    handicap: u32,
    window: Second,
    classic: ContestTraceVector,
    best: ContestBest,
}

impl Default for LeagueContest {
    fn default() -> Self {
        LeagueContest::new()
    }
}

impl LeagueContest {
    pub fn new() -> Self {
        LeagueContest {
            handicap: NEUTRAL_HANDICAP,
            window: SPRINT_WINDOW,
            classic: ContestTraceVector::new(),
            best: ContestBest::new(),
        }
    }

    /// Provide the classic path to take the intermediate points from.
    pub fn feed(&mut self, classic: &[TracePoint]) {
        self.classic = classic.iter().copied().collect();
    }

    fn build_solution(&self, start: TracePoint, finish: TracePoint) -> ContestTraceVector {
        let mut points: ContestTraceVector = smallvec![start];
        points.extend(
            self.classic
                .iter()
                .filter(|point| point.is_newer_than(&start) && point.is_older_than(&finish))
                .take(LEAGUE_TURNPOINTS)
                .copied(),
        );
        while points.len() < LEAGUE_TURNPOINTS + 1 {
            let previous = points[points.len() - 1];
            points.push(previous);
        }
        points.push(finish);
        points
    }
}

impl Contest for LeagueContest {
    fn reset(&mut self) {
        self.classic.clear();
        self.best.reset();
    }

    fn solve(&mut self, trace: &Trace, _exhaustive: bool) -> SolverResult {
        let Some(finish) = trace.back().copied() else {
            return SolverResult::Failed;
        };
        let window_start = finish.time.saturating_sub(self.window);
        let Some(start) = trace.iter().find(|point| point.time >= window_start).copied() else {
            return SolverResult::Failed;
        };
        if !finish.is_newer_than(&start) || finish.integer_altitude() < start.integer_altitude() {
            return SolverResult::Failed;
        }

        let points = self.build_solution(start, finish);
        let distance: f64 = points.windows(2).map(|leg| leg[0].distance(&leg[1])).sum();
        let score = apply_shifted_handicap(distance / METERS_PER_KM / SPRINT_HOURS, self.handicap);
        let result = ContestResult::new(score, distance, finish.delta_time(&start));

        if self.best.update(result, &points) {
            debug!(score, distance, "league result improved");
            SolverResult::Valid
        } else {
            SolverResult::Failed
        }
    }

    fn best_result(&self) -> ContestResult {
        self.best.result()
    }

    fn best_solution(&self) -> &[TracePoint] {
        self.best.solution()
    }

    fn set_handicap(&mut self, handicap: u32) {
        let handicap = effective_handicap(handicap);
        if self.handicap != handicap {
            self.handicap = handicap;
            self.reset();
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Composites
// -------------------------------------------------------------------------------------------------

/// How a composite combines its fed components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompositeRule {
    /// Sum of the component scores; distance and path of the first defined component
    SumOfScores,
    /// The highest-scoring component
    BestOf,
    /// `handicap(d₀ + max(ratios[i] × dᵢ₊₁))` in km: the first component's distance plus
    /// the best weighted bonus of the others
    DistancePlusBestBonus { ratios: Vec<f64> },
}

/// Result computed from the results of sibling policies.
#[derive(Debug, Clone)]
pub struct CompositeContest {
    rule: CompositeRule,
    handicap: u32,
    inputs: Vec<(ContestResult, ContestTraceVector)>,
    best: ContestBest,
}

impl CompositeContest {
    /// Panics
    /// ----------
    /// * If `num_inputs` is zero.
    pub fn new(rule: CompositeRule, num_inputs: usize) -> Self {
        assert!(num_inputs > 0, "a composite needs at least one component");
        CompositeContest {
            rule,
            handicap: NEUTRAL_HANDICAP,
            inputs: vec![Default::default(); num_inputs],
            best: ContestBest::new(),
        }
    }

    pub fn rule(&self) -> &CompositeRule {
        &self.rule
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Store the current result of component `slot`.
    pub fn feed(&mut self, slot: usize, result: ContestResult, solution: &[TracePoint]) {
        if let Some(input) = self.inputs.get_mut(slot) {
            input.0 = result;
            input.1 = solution.iter().copied().collect();
        }
    }

    fn combine(&self) -> Option<(ContestResult, &ContestTraceVector)> {
        let mut defined = self.inputs.iter().filter(|(result, _)| result.is_defined());

        match &self.rule {
            CompositeRule::SumOfScores => {
                let (first, solution) = defined.next()?;
                let score: f64 = self.inputs.iter().map(|(result, _)| result.score).sum();
                Some((ContestResult::new(score, first.distance, first.time), solution))
            }
            CompositeRule::BestOf => defined
                .fold(None, |best: Option<&(ContestResult, ContestTraceVector)>, input| match best {
                    Some(b) if b.0.score >= input.0.score => best,
                    _ => Some(input),
                })
                .map(|(result, solution)| (*result, solution)),
            CompositeRule::DistancePlusBestBonus { ratios } => {
                let (base, solution) = self.inputs.first().filter(|(result, _)| result.is_defined())?;
                let bonus = self.inputs[1..]
                    .iter()
                    .zip(ratios)
                    .filter(|((result, _), _)| result.is_defined())
                    .map(|((result, _), ratio)| ratio * result.distance)
                    .fold(0.0, f64::max);
                let score = apply_handicap((base.distance + bonus) / METERS_PER_KM, self.handicap);
                Some((ContestResult::new(score, base.distance, base.time), solution))
            }
        }
    }
}

impl Contest for CompositeContest {
    fn reset(&mut self) {
        for input in &mut self.inputs {
            *input = Default::default();
        }
        self.best.reset();
    }

    fn solve(&mut self, _trace: &Trace, _exhaustive: bool) -> SolverResult {
        let Some((result, solution)) = self.combine() else {
            return SolverResult::Failed;
        };
        let solution = solution.clone();
        if self.best.update(result, &solution) {
            debug!(score = result.score, rule = ?self.rule, "composite result improved");
            SolverResult::Valid
        } else {
            SolverResult::Failed
        }
    }

    fn best_result(&self) -> ContestResult {
        self.best.result()
    }

    fn best_solution(&self) -> &[TracePoint] {
        self.best.solution()
    }

    fn set_handicap(&mut self, handicap: u32) {
        let handicap = effective_handicap(handicap);
        if self.handicap != handicap {
            self.handicap = handicap;
            self.reset();
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Closed set of policies
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ContestPolicy {
    Path(PathContest),
    Triangle(TriangleContest),
    League(LeagueContest),
    Composite(CompositeContest),
}

macro_rules! dispatch {
    ($self:expr, $policy:ident => $body:expr) => {
        match $self {
            ContestPolicy::Path($policy) => $body,
            ContestPolicy::Triangle($policy) => $body,
            ContestPolicy::League($policy) => $body,
            ContestPolicy::Composite($policy) => $body,
        }
    };
}

impl Contest for ContestPolicy {
    fn reset(&mut self) {
        dispatch!(self, policy => policy.reset())
    }

    fn solve(&mut self, trace: &Trace, exhaustive: bool) -> SolverResult {
        dispatch!(self, policy => policy.solve(trace, exhaustive))
    }

    fn best_result(&self) -> ContestResult {
        dispatch!(self, policy => policy.best_result())
    }

    fn best_solution(&self) -> &[TracePoint] {
        dispatch!(self, policy => policy.best_solution())
    }

    fn set_handicap(&mut self, handicap: u32) {
        dispatch!(self, policy => policy.set_handicap(handicap))
    }

    fn set_incremental(&mut self, incremental: bool) {
        dispatch!(self, policy => policy.set_incremental(incremental))
    }

    fn counters(&self) -> SolveCounters {
        dispatch!(self, policy => policy.counters())
    }
}

#[cfg(test)]
mod policies_test {
    use super::*;
    use crate::geo::{FlatProjection, GeoPoint};
    use crate::solvers::{PathSolverConfig, TriangleRules, TriangleSolverConfig};
    use crate::trace::Fix;
    use approx::assert_relative_eq;

    fn point(origin: &GeoPoint, east_km: f64, time: Second, altitude: f64) -> TracePoint {
        let projection = FlatProjection::new(*origin);
        TracePoint::from_fix(&Fix::new(origin.offset_east(east_km * 1000.0), time, altitude), &projection)
    }

    #[test]
    fn test_path_scoring_bonus_floor_and_sprint() {
        let solution = PathSolution {
            points: ContestTraceVector::new(),
            distance: 200_000.0,
            weighted_distance: 200_000.0,
            time: 7200,
        };

        let scoring = PathScoring::new(1.0).bonus(0.3);
        assert_relative_eq!(scoring.result(&solution, 100).score, 260.0, max_relative = 1e-12);
        assert_relative_eq!(scoring.result(&solution, 0).score, 260.0, max_relative = 1e-12);

        let floor = PathScoring::new(1.0).min_score(250.0);
        assert!(!floor.result(&solution, 100).is_defined());

        let sprint = PathScoring::new(1.0).sprint(2.5);
        assert_relative_eq!(sprint.result(&solution, 100).score, 80.0, max_relative = 1e-12);
    }

    #[test]
    fn test_triangle_gap_penalty() {
        let mut solution = TriangleSolution {
            points: ContestTraceVector::new(),
            distance: 100_000.0,
            gap: 500.0,
            time: 3600,
        };

        let plain = TriangleScoring::new(1.0);
        assert_relative_eq!(plain.result(&solution, 100).score, 100.0, max_relative = 1e-12);

        let penalised = TriangleScoring::new(1.0).gap_penalty(true);
        let result = penalised.result(&solution, 100);
        assert_relative_eq!(result.score, 99.5, max_relative = 1e-12);
        assert_relative_eq!(result.distance, 99_500.0, max_relative = 1e-12);

        solution.gap = 25_000.0;
        assert!(!penalised.result(&solution, 100).is_defined());
    }

    #[test]
    fn test_league_repeats_missing_points() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut trace = Trace::new(0, None, 64);
        for i in 0..5u32 {
            trace.append(&Fix::new(origin.offset_east(f64::from(i) * 10_000.0), i * 600, 1000.0));
        }

        let mut league = LeagueContest::new();
        // a single fed point lies inside the window
        league.feed(&[point(&origin, 20.0, 1200, 1000.0)]);
        assert_eq!(league.solve(&trace, false), SolverResult::Valid);

        let solution = league.best_solution();
        assert_eq!(solution.len(), 5);
        assert_eq!(solution[1].time, 1200);
        assert_eq!(solution[2].time, 1200);
        assert_eq!(solution[3].time, 1200);
        assert_eq!(solution[4].time, 2400);

        let result = league.best_result();
        assert_relative_eq!(result.distance, 40_000.0, max_relative = 1e-3);
        assert_relative_eq!(result.score, result.distance / 1000.0 / 2.5, max_relative = 1e-12);

        // nothing new: no improvement
        assert_eq!(league.solve(&trace, false), SolverResult::Failed);
    }

    #[test]
    fn test_league_rejects_lower_finish() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut trace = Trace::new(0, None, 64);
        trace.append(&Fix::new(origin, 0, 1500.0));
        trace.append(&Fix::new(origin.offset_east(30_000.0), 1800, 900.0));

        let mut league = LeagueContest::new();
        assert_eq!(league.solve(&trace, true), SolverResult::Failed);
        assert!(!league.best_result().is_defined());
    }

    #[test]
    fn test_composite_rules() {
        let origin = GeoPoint::new(0.0, 0.0);
        let path = [point(&origin, 0.0, 0, 1000.0), point(&origin, 50.0, 3600, 1000.0)];
        let free = ContestResult::new(100.0, 100_000.0, 3600);
        let fai = ContestResult::new(24.0, 80_000.0, 3000);
        let out_and_return = ContestResult::new(130.0, 100_000.0, 3000);

        let mut sum = CompositeContest::new(CompositeRule::SumOfScores, 2);
        sum.feed(0, free, &path);
        sum.feed(1, fai, &[]);
        assert_eq!(sum.solve(&Trace::new(0, None, 16), true), SolverResult::Valid);
        assert_relative_eq!(sum.best_result().score, 124.0);
        assert_eq!(sum.best_solution().len(), 2);

        let mut best_of = CompositeContest::new(CompositeRule::BestOf, 3);
        best_of.feed(0, free, &path);
        best_of.feed(1, fai, &[]);
        best_of.feed(2, out_and_return, &[]);
        assert_eq!(best_of.solve(&Trace::new(0, None, 16), true), SolverResult::Valid);
        assert_relative_eq!(best_of.best_result().score, 130.0);

        let ratios = vec![0.3, 0.2];
        let mut free_bonus = CompositeContest::new(CompositeRule::DistancePlusBestBonus { ratios }, 3);
        free_bonus.feed(0, free, &path);
        free_bonus.feed(1, fai, &[]);
        free_bonus.feed(2, out_and_return, &[]);
        assert_eq!(free_bonus.solve(&Trace::new(0, None, 16), true), SolverResult::Valid);
        // 100 km + max(0.3 × 80, 0.2 × 100)
        assert_relative_eq!(free_bonus.best_result().score, 124.0, max_relative = 1e-12);
    }

    #[test]
    fn test_composite_without_inputs_fails() {
        let mut best_of = CompositeContest::new(CompositeRule::BestOf, 2);
        assert_eq!(best_of.solve(&Trace::new(0, None, 16), true), SolverResult::Failed);
    }

    #[test]
    fn test_policy_dispatch_and_handicap_reset() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut trace = Trace::new(0, None, 64);
        trace.append(&Fix::new(origin, 0, 1000.0));
        trace.append(&Fix::new(origin.offset_east(50_000.0), 1800, 1000.0));
        trace.append(&Fix::new(origin.offset_east(100_000.0), 3600, 1000.0));

        let solver = PathSolver::new(PathSolverConfig::new(2));
        let mut policy = ContestPolicy::Path(PathContest::new(solver, PathScoring::new(1.0)));
        assert_eq!(policy.solve(&trace, true), SolverResult::Valid);
        assert_relative_eq!(policy.best_result().score, 100.0, max_relative = 1e-3);
        assert_eq!(policy.counters().solves, 1);

        policy.set_handicap(125);
        assert!(!policy.best_result().is_defined());
        assert_eq!(policy.solve(&trace, true), SolverResult::Valid);
        assert_relative_eq!(policy.best_result().score, 80.0, max_relative = 1e-3);

        let triangle = TriangleSolver::new(TriangleSolverConfig::new(TriangleRules::Fai));
        let mut policy = ContestPolicy::Triangle(TriangleContest::new(triangle, TriangleScoring::new(0.3)));
        assert_eq!(policy.solve(&trace, true), SolverResult::Failed);
        assert!(policy.best_solution().is_empty());
    }
}
