//! # Ruleset catalogue
//!
//! [`ContestKind`] names the supported rulesets; [`Ruleset::new`] turns one into the list of
//! policies the [`ContestManager`](super::ContestManager) drives.
//!
//! ## Components and slots
//!
//! A ruleset is an ordered list of [`Component`]s. League and composite components read the
//! best results of components listed before them (their `inputs`), so running the list in
//! order feeds every composite with this tick's results.
//!
//! The three [`ContestStatistics`](super::ContestStatistics) slots map to components:
//!
//! | Slot | Content |
//! |---|---|
//! | 0 | primary distance component |
//! | 1 | triangle component |
//! | 2 | composite or league result |
//!
//! Single-component rulesets only fill slot 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    constants::{MAX_CLOSING_DISTANCE, SPRINT_HOURS, SPRINT_WINDOW},
    contest_errors::ContestError,
    settings::ContestSettings,
    solvers::{PathSolver, PathSolverConfig, TriangleRules, TriangleSolver, TriangleSolverConfig},
};

use super::{
    policies::{
        CompositeContest, CompositeRule, ContestPolicy, LeagueContest, PathContest, PathScoring, TriangleContest,
        TriangleScoring,
    },
    result::NUM_RESULT_SLOTS,
    scoring::Contest,
};

/// Stage weights of the OLC classic distance, in fifths.
const OLC_CLASSIC_WEIGHTS: [u32; 6] = [5, 5, 5, 5, 4, 3];

/// DMSt quadrilateral legs shorter than this are not scored.
const DMST_MIN_LEG_DISTANCE: f64 = 10_000.0;

/// DMSt results below this score are discarded.
const DMST_MIN_SCORE: f64 = 50.0;

/// Supported scoring rulesets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContestKind {
    OlcClassic,
    OlcFai,
    OlcSprint,
    OlcLeague,
    OlcPlus,
    DmstQuadrilateral,
    DmstTriangle,
    DmstOutAndReturn,
    Dmst,
    WeglideDistance,
    WeglideFai,
    WeglideOutAndReturn,
    WeglideFree,
    #[serde(rename = "xcontest")]
    XContest,
    DhvXc,
    #[serde(rename = "netcoupe")]
    NetCoupe,
}

impl ContestKind {
    pub const ALL: [ContestKind; 16] = [
        ContestKind::OlcClassic,
        ContestKind::OlcFai,
        ContestKind::OlcSprint,
        ContestKind::OlcLeague,
        ContestKind::OlcPlus,
        ContestKind::DmstQuadrilateral,
        ContestKind::DmstTriangle,
        ContestKind::DmstOutAndReturn,
        ContestKind::Dmst,
        ContestKind::WeglideDistance,
        ContestKind::WeglideFai,
        ContestKind::WeglideOutAndReturn,
        ContestKind::WeglideFree,
        ContestKind::XContest,
        ContestKind::DhvXc,
        ContestKind::NetCoupe,
    ];

    /// Stable kebab-case name, identical to the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            ContestKind::OlcClassic => "olc-classic",
            ContestKind::OlcFai => "olc-fai",
            ContestKind::OlcSprint => "olc-sprint",
            ContestKind::OlcLeague => "olc-league",
            ContestKind::OlcPlus => "olc-plus",
            ContestKind::DmstQuadrilateral => "dmst-quadrilateral",
            ContestKind::DmstTriangle => "dmst-triangle",
            ContestKind::DmstOutAndReturn => "dmst-out-and-return",
            ContestKind::Dmst => "dmst",
            ContestKind::WeglideDistance => "weglide-distance",
            ContestKind::WeglideFai => "weglide-fai",
            ContestKind::WeglideOutAndReturn => "weglide-out-and-return",
            ContestKind::WeglideFree => "weglide-free",
            ContestKind::XContest => "xcontest",
            ContestKind::DhvXc => "dhv-xc",
            ContestKind::NetCoupe => "netcoupe",
        }
    }
}

impl fmt::Display for ContestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContestKind {
    type Err = ContestError;

    /// Parse a ruleset name, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ContestKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ContestError::UnknownContest(name.to_string()))
    }
}

/// One policy of a ruleset and the components it reads from.
#[derive(Debug, Clone)]
pub struct Component {
    pub policy: ContestPolicy,
    /// Indices of earlier components fed to a league or composite policy
    pub inputs: SmallVec<[usize; 3]>,
}

impl Component {
    fn new(policy: ContestPolicy) -> Self {
        Component {
            policy,
            inputs: SmallVec::new(),
        }
    }

    fn fed_by(policy: ContestPolicy, inputs: &[usize]) -> Self {
        Component {
            policy,
            inputs: inputs.iter().copied().collect(),
        }
    }

    /// Whether the component consumes the results of other components.
    pub fn is_dependent(&self) -> bool {
        !self.inputs.is_empty()
    }
}

/// The policies of one ruleset and how they map to result slots.
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub kind: ContestKind,
    pub components: Vec<Component>,
    /// Component shown in each result slot
    pub slots: [Option<usize>; NUM_RESULT_SLOTS],
}

impl Ruleset {
    /// Build the policies of `kind` configured from `settings`.
    ///
    /// Handicap, incremental mode, prediction, altitude limit and tuning are applied to
    /// every policy that uses them.
    pub fn new(kind: ContestKind, settings: &ContestSettings) -> Self {
        let builder = PolicyBuilder { settings };

        let (components, slots): (Vec<Component>, [Option<usize>; NUM_RESULT_SLOTS]) = match kind {
            ContestKind::OlcClassic => (vec![builder.olc_classic()], [Some(0), None, None]),
            ContestKind::OlcFai => (
                vec![builder.triangle(TriangleRules::Fai, TriangleScoring::new(0.3))],
                [Some(0), None, None],
            ),
            ContestKind::OlcSprint => (
                vec![builder.path(
                    PathSolverConfig::new(4)
                        .time_window(SPRINT_WINDOW)
                        .finish_at_last_point(true)
                        .finish_alt_diff(0),
                    PathScoring::new(1.0).sprint(SPRINT_HOURS),
                )],
                [Some(0), None, None],
            ),
            ContestKind::OlcLeague => (
                vec![
                    builder.olc_classic(),
                    builder.dependent(ContestPolicy::League(LeagueContest::new()), &[0]),
                ],
                [Some(0), None, Some(1)],
            ),
            ContestKind::OlcPlus => (
                vec![
                    builder.olc_classic(),
                    builder.triangle(TriangleRules::Fai, TriangleScoring::new(0.3)),
                    builder.composite(CompositeRule::SumOfScores, &[0, 1]),
                ],
                [Some(0), Some(1), Some(2)],
            ),
            ContestKind::DmstQuadrilateral => (vec![builder.dmst_quadrilateral()], [Some(0), None, None]),
            ContestKind::DmstTriangle => (vec![builder.dmst_triangle()], [Some(0), None, None]),
            ContestKind::DmstOutAndReturn => (vec![builder.dmst_out_and_return()], [Some(0), None, None]),
            ContestKind::Dmst => (
                vec![
                    builder.dmst_quadrilateral(),
                    builder.dmst_triangle(),
                    builder.dmst_out_and_return(),
                    builder.composite(CompositeRule::BestOf, &[0, 1, 2]),
                ],
                [Some(0), Some(1), Some(3)],
            ),
            ContestKind::WeglideDistance => (vec![builder.weglide_distance()], [Some(0), None, None]),
            ContestKind::WeglideFai => (
                vec![builder.triangle(TriangleRules::Fai, TriangleScoring::new(1.0))],
                [Some(0), None, None],
            ),
            ContestKind::WeglideOutAndReturn => (vec![builder.weglide_out_and_return()], [Some(0), None, None]),
            ContestKind::WeglideFree => (
                vec![
                    builder.weglide_distance(),
                    builder.triangle(TriangleRules::Fai, TriangleScoring::new(1.0)),
                    builder.weglide_out_and_return(),
                    builder.composite(
                        CompositeRule::DistancePlusBestBonus {
                            ratios: vec![0.3, 0.2],
                        },
                        &[0, 1, 2],
                    ),
                ],
                [Some(0), Some(1), Some(3)],
            ),
            ContestKind::XContest => (builder.free_flight([1.0, 1.2, 1.4]), [Some(0), Some(2), Some(3)]),
            ContestKind::DhvXc => (builder.free_flight([1.5, 1.75, 2.0]), [Some(0), Some(2), Some(3)]),
            ContestKind::NetCoupe => (
                vec![builder.path(builder.free(4), PathScoring::new(1.0))],
                [Some(0), None, None],
            ),
        };

        debug_assert!(components
            .iter()
            .enumerate()
            .all(|(i, component)| component.inputs.iter().all(|&input| input < i)));

        Ruleset {
            kind,
            components,
            slots,
        }
    }
}

/// Applies the settings shared by every policy of a ruleset.
struct PolicyBuilder<'a> {
    settings: &'a ContestSettings,
}

impl PolicyBuilder<'_> {
    fn free(&self, legs: usize) -> PathSolverConfig {
        PathSolverConfig::new(legs).finish_alt_diff(self.settings.finish_alt_diff)
    }

    fn closed(&self, legs: usize) -> PathSolverConfig {
        self.free(legs).max_closing_distance(MAX_CLOSING_DISTANCE)
    }

    fn path(&self, config: PathSolverConfig, scoring: PathScoring) -> Component {
        let mut solver = PathSolver::new(config);
        solver.set_tick_budget(self.settings.tuning.dijkstra_tick_budget);

        let mut contest = PathContest::new(solver, scoring);
        contest.set_incremental(self.settings.incremental);
        contest.set_handicap(self.settings.handicap);
        Component::new(ContestPolicy::Path(contest))
    }

    fn triangle(&self, rules: TriangleRules, scoring: TriangleScoring) -> Component {
        let config = TriangleSolverConfig::new(rules)
            .predict(self.settings.predict)
            .finish_alt_diff(self.settings.finish_alt_diff);
        let mut solver = TriangleSolver::new(config);
        solver.set_tuning(self.settings.tuning.triangle());

        let mut contest = TriangleContest::new(solver, scoring);
        contest.set_incremental(self.settings.incremental);
        contest.set_handicap(self.settings.handicap);
        Component::new(ContestPolicy::Triangle(contest))
    }

    fn dependent(&self, mut policy: ContestPolicy, inputs: &[usize]) -> Component {
        policy.set_handicap(self.settings.handicap);
        Component::fed_by(policy, inputs)
    }

    fn composite(&self, rule: CompositeRule, inputs: &[usize]) -> Component {
        self.dependent(
            ContestPolicy::Composite(CompositeContest::new(rule, inputs.len())),
            inputs,
        )
    }

    fn olc_classic(&self) -> Component {
        self.path(
            self.free(6).continuous(true).stage_weights(&OLC_CLASSIC_WEIGHTS),
            PathScoring::new(1.0),
        )
    }

    fn dmst_quadrilateral(&self) -> Component {
        self.path(
            self.closed(4).min_leg_distance(DMST_MIN_LEG_DISTANCE),
            PathScoring::new(1.0).min_score(DMST_MIN_SCORE),
        )
    }

    fn dmst_triangle(&self) -> Component {
        self.triangle(
            TriangleRules::Fai,
            TriangleScoring::new(1.0).bonus(0.4).min_score(DMST_MIN_SCORE),
        )
    }

    fn dmst_out_and_return(&self) -> Component {
        self.path(
            self.closed(2),
            PathScoring::new(1.0).bonus(0.3).min_score(DMST_MIN_SCORE),
        )
    }

    fn weglide_distance(&self) -> Component {
        self.path(self.free(6), PathScoring::new(1.0))
    }

    fn weglide_out_and_return(&self) -> Component {
        self.path(self.closed(2), PathScoring::new(1.0))
    }

    /// Free distance, flat triangle and FAI triangle with gap penalty, best of the three.
    fn free_flight(&self, points_per_km: [f64; 3]) -> Vec<Component> {
        let [free, flat, fai] = points_per_km;
        vec![
            self.path(self.free(4), PathScoring::new(free)),
            self.triangle(TriangleRules::Flat, TriangleScoring::new(flat).gap_penalty(true)),
            self.triangle(TriangleRules::Fai, TriangleScoring::new(fai).gap_penalty(true)),
            self.composite(CompositeRule::BestOf, &[0, 1, 2]),
        ]
    }
}
