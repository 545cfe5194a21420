//! # Contest engine settings
//!
//! This module defines [`ContestSettings`], the configuration handed to
//! [`ContestManager`](crate::contest::ContestManager), together with its validating builder
//! and the [`SolverTuning`] knobs of the search engines.
//!
//! ## Overview
//!
//! The settings cover three concerns:
//!
//! - **Ruleset selection and scoring**: `contest`, `handicap`, `finish_alt_diff`.
//! - **Live operation**: `predict` (preview a closed loop at the newest point) and
//!   `incremental` (trade completeness for speed while flying).
//! - **Trace store construction**: `trace_capacity`, `trace_max_time`, `no_thin_time`.
//!
//! Empirical search budgets live in [`SolverTuning`]; their defaults come from
//! [`crate::constants`].
//!
//! ## Serialization
//!
//! Both structs derive `serde` traits. Missing fields fall back to their defaults, so a
//! partial document such as `{"contest": "dmst", "handicap": 108}` is valid. Deserialized
//! values are not validated; pass them through [`ContestSettings::validate`] (which
//! [`ContestManager::new`](crate::contest::ContestManager::new) does) before use.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xcscore::contest::ContestKind;
//! use xcscore::settings::ContestSettings;
//!
//! let settings = ContestSettings::builder()
//!     .contest(ContestKind::OlcPlus)
//!     .handicap(108)
//!     .incremental(true)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Second, DEFAULT_FINISH_ALT_DIFF, DEFAULT_NO_THIN_TIME, DEFAULT_TRACE_CAPACITY, DIJKSTRA_TICK_BUDGET,
        MAX_BNB_ITERATIONS, MAX_BNB_TREE_SIZE, RELAX_RATIO, TICK_ITERATION_DIVISOR,
    },
    contest::ContestKind,
    contest_errors::ContestError,
    solvers::TriangleTuning,
};

/// Smallest trace capacity accepted by the builder.
///
/// The longest path rulesets need seven points; the rest is headroom for thinning.
pub const MIN_TRACE_CAPACITY: usize = 16;

/// Empirically tuned search budgets.
///
/// Fields
/// -----------------
/// * `dijkstra_tick_budget` – Node expansions of a path search per non-exhaustive tick.
/// * `relax_ratio` – Share of the point count by which neighbouring closing pairs are merged.
/// * `tick_iteration_divisor` – Predictive triangle ticks get `n² / tick_iteration_divisor`
///   branch-and-bound iterations.
/// * `max_iterations` – Hard ceiling on the iterations of one branch-and-bound run.
/// * `max_tree_size` – Hard ceiling on the open candidate sets of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverTuning {
    pub dijkstra_tick_budget: usize,
    pub relax_ratio: f64,
    pub tick_iteration_divisor: usize,
    pub max_iterations: usize,
    pub max_tree_size: usize,
}

impl Default for SolverTuning {
    fn default() -> Self {
        SolverTuning {
            dijkstra_tick_budget: DIJKSTRA_TICK_BUDGET,
            relax_ratio: RELAX_RATIO,
            tick_iteration_divisor: TICK_ITERATION_DIVISOR,
            max_iterations: MAX_BNB_ITERATIONS,
            max_tree_size: MAX_BNB_TREE_SIZE,
        }
    }
}

impl SolverTuning {
    /// The branch-and-bound part of the tuning.
    pub fn triangle(&self) -> TriangleTuning {
        TriangleTuning {
            relax_ratio: self.relax_ratio,
            tick_iteration_divisor: self.tick_iteration_divisor,
            max_iterations: self.max_iterations,
            max_tree_size: self.max_tree_size,
        }
    }
}

/// Configuration of a [`ContestManager`](crate::contest::ContestManager).
///
/// Defaults
/// -----------------
/// * `contest`: [`ContestKind::OlcClassic`]
/// * `handicap`: 100 (0 is treated as 100)
/// * `predict`: false
/// * `incremental`: false
/// * `finish_alt_diff`: 1000 m
/// * `trace_capacity`: 1024 points
/// * `trace_max_time`: none
/// * `no_thin_time`: 60 s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestSettings {
    pub contest: ContestKind,
    pub handicap: u32,
    pub predict: bool,
    pub incremental: bool,
    /// Maximum altitude loss between start and finish, in meters
    pub finish_alt_diff: u32,
    pub trace_capacity: usize,
    /// Points older than this many seconds before the newest fix are evicted
    pub trace_max_time: Option<Second>,
    pub no_thin_time: Second,
    pub tuning: SolverTuning,
}

impl Default for ContestSettings {
    fn default() -> Self {
        ContestSettings {
            contest: ContestKind::OlcClassic,
            handicap: 100,
            predict: false,
            incremental: false,
            finish_alt_diff: DEFAULT_FINISH_ALT_DIFF,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            trace_max_time: None,
            no_thin_time: DEFAULT_NO_THIN_TIME,
            tuning: SolverTuning::default(),
        }
    }
}

impl ContestSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`ContestSettingsBuilder`] starting from the defaults.
    pub fn builder() -> ContestSettingsBuilder {
        ContestSettingsBuilder::new()
    }

    /// Check the settings against the rules enforced by [`ContestSettingsBuilder::build`].
    ///
    /// Return
    /// ----------
    /// * `Err(ContestError::InvalidParameter)` naming the first offending field.
    pub fn validate(&self) -> Result<(), ContestError> {
        if self.trace_capacity < MIN_TRACE_CAPACITY {
            return Err(ContestError::InvalidParameter(format!(
                "trace_capacity must be >= {MIN_TRACE_CAPACITY}"
            )));
        }
        if self.trace_max_time == Some(0) {
            return Err(ContestError::InvalidParameter("trace_max_time must be > 0".into()));
        }

        let tuning = &self.tuning;
        if tuning.dijkstra_tick_budget == 0 {
            return Err(ContestError::InvalidParameter(
                "dijkstra_tick_budget must be >= 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&tuning.relax_ratio) {
            return Err(ContestError::InvalidParameter(
                "relax_ratio must be in [0, 1)".into(),
            ));
        }
        if tuning.tick_iteration_divisor == 0 {
            return Err(ContestError::InvalidParameter(
                "tick_iteration_divisor must be >= 1".into(),
            ));
        }
        if tuning.max_iterations == 0 || tuning.max_tree_size == 0 {
            return Err(ContestError::InvalidParameter(
                "branch-and-bound ceilings must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ContestSettings`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ContestSettingsBuilder {
    settings: ContestSettings,
}

impl ContestSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contest(mut self, contest: ContestKind) -> Self {
        self.settings.contest = contest;
        self
    }
    pub fn handicap(mut self, handicap: u32) -> Self {
        self.settings.handicap = handicap;
        self
    }
    pub fn predict(mut self, predict: bool) -> Self {
        self.settings.predict = predict;
        self
    }
    pub fn incremental(mut self, incremental: bool) -> Self {
        self.settings.incremental = incremental;
        self
    }
    pub fn finish_alt_diff(mut self, v: u32) -> Self {
        self.settings.finish_alt_diff = v;
        self
    }
    pub fn trace_capacity(mut self, v: usize) -> Self {
        self.settings.trace_capacity = v;
        self
    }
    pub fn trace_max_time(mut self, v: Option<Second>) -> Self {
        self.settings.trace_max_time = v;
        self
    }
    pub fn no_thin_time(mut self, v: Second) -> Self {
        self.settings.no_thin_time = v;
        self
    }
    pub fn tuning(mut self, tuning: SolverTuning) -> Self {
        self.settings.tuning = tuning;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `trace_capacity ≥ MIN_TRACE_CAPACITY`
    /// * `trace_max_time`, when set, is at least one second
    /// * `dijkstra_tick_budget ≥ 1`, `tick_iteration_divisor ≥ 1`
    /// * `0 ≤ relax_ratio < 1`
    /// * `max_iterations ≥ 1`, `max_tree_size ≥ 1`
    ///
    /// Return
    /// ----------
    /// * `Ok(ContestSettings)` if every rule holds.
    /// * `Err(ContestError::InvalidParameter)` otherwise.
    pub fn build(self) -> Result<ContestSettings, ContestError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl fmt::Display for ContestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return write!(
                f,
                "{} (handicap {}, predict {}, incremental {})",
                self.contest, self.handicap, self.predict, self.incremental
            );
        }

        const PARAM_COL: usize = 36;
        writeln!(f, "Contest settings")?;
        writeln!(f, "----------------")?;

        macro_rules! line {
            ($fmt:expr, $val:expr, $comment:expr) => {{
                let s = format!($fmt, $val);
                let pad = " ".repeat(PARAM_COL.saturating_sub(s.len()).max(1));
                writeln!(f, "  {}{}# {}", s, pad, $comment)
            }};
        }

        line!("contest         = {}", self.contest, "Scoring ruleset")?;
        line!("handicap        = {}", self.handicap, "0 disables handicapping")?;
        line!("predict         = {}", self.predict, "Preview a closed loop at the newest point")?;
        line!("incremental     = {}", self.incremental, "Live-mode search shortcuts")?;
        line!("finish_alt_diff = {} m", self.finish_alt_diff, "Maximum start/finish altitude loss")?;
        line!("trace_capacity  = {}", self.trace_capacity, "Points kept before thinning")?;
        match self.trace_max_time {
            Some(t) => line!("trace_max_time  = {} s", t, "Time window of the trace")?,
            None => line!("trace_max_time  = {}", "none", "Time window of the trace")?,
        }
        line!("no_thin_time    = {} s", self.no_thin_time, "Recent window spared by thinning")?;

        writeln!(f, "\n[Solver tuning]")?;
        line!("dijkstra_tick_budget   = {}", self.tuning.dijkstra_tick_budget, "Expansions per tick")?;
        line!("relax_ratio            = {:.3}", self.tuning.relax_ratio, "Closing pair merge ratio")?;
        line!("tick_iteration_divisor = {}", self.tuning.tick_iteration_divisor, "n² / divisor per tick")?;
        line!("max_iterations         = {}", self.tuning.max_iterations, "Iterations per run")?;
        line!("max_tree_size          = {}", self.tuning.max_tree_size, "Open candidate sets")
    }
}

#[cfg(test)]
mod settings_test {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = ContestSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(ContestSettings::builder().build(), Ok(settings));
    }

    #[test]
    fn test_builder_rejects_small_capacity() {
        let err = ContestSettings::builder().trace_capacity(8).build().unwrap_err();
        assert!(matches!(err, ContestError::InvalidParameter(msg) if msg.contains("trace_capacity")));
    }

    #[test]
    fn test_builder_rejects_bad_tuning() {
        let tuning = SolverTuning {
            relax_ratio: 1.5,
            ..SolverTuning::default()
        };
        assert!(ContestSettings::builder().tuning(tuning).build().is_err());

        let tuning = SolverTuning {
            tick_iteration_divisor: 0,
            ..SolverTuning::default()
        };
        assert!(ContestSettings::builder().tuning(tuning).build().is_err());

        assert!(ContestSettings::builder().trace_max_time(Some(0)).build().is_err());
    }

    #[test]
    fn test_triangle_tuning_matches_defaults() {
        assert_eq!(SolverTuning::default().triangle(), TriangleTuning::default());
    }

    #[test]
    fn test_display_mentions_contest() {
        let settings = ContestSettings::builder().contest(ContestKind::Dmst).build().unwrap();
        assert!(settings.to_string().starts_with("dmst"));
        assert!(format!("{settings:#}").contains("max_tree_size"));
    }
}
