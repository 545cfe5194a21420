//! # Contest manager
//!
//! Entry point of the crate: owns the trace store and the policies of the configured
//! ruleset, and drives them tick by tick.
//!
//! ## Tick model
//!
//! The host calls [`ContestManager::append`] for every fix and [`ContestManager::update_idle`]
//! once per cycle. Each update runs the ruleset's components in order; league and composite
//! components are fed the current best of their inputs before they are solved. The result
//! slots of [`ContestStatistics`] are refreshed at the end of every update.
//!
//! ```rust,no_run
//! use xcscore::contest::{ContestKind, ContestManager};
//! use xcscore::geo::GeoPoint;
//! use xcscore::settings::ContestSettings;
//! use xcscore::trace::Fix;
//!
//! let settings = ContestSettings::builder().contest(ContestKind::Dmst).build().unwrap();
//! let mut manager = ContestManager::new(settings).unwrap();
//!
//! manager.append(&Fix::new(GeoPoint::new(47.0, 8.0), 0, 1200.0));
//! // ... more fixes
//! if manager.update_idle(false) {
//!     println!("{:?}", manager.statistics().best_result());
//! }
//! ```

use tracing::{debug, info};

use crate::{
    contest_errors::ContestError,
    counters::SolveCounters,
    settings::ContestSettings,
    trace::{Fix, Trace},
};

use super::{
    policies::ContestPolicy,
    result::ContestStatistics,
    ruleset::{ContestKind, Ruleset},
    scoring::{effective_handicap, Contest},
};

#[derive(Debug, Clone)]
pub struct ContestManager {
    settings: ContestSettings,
    trace: Trace,
    ruleset: Ruleset,
    statistics: ContestStatistics,
}

impl ContestManager {
    /// Create a manager for validated settings.
    ///
    /// Return
    /// ----------
    /// * `Err(ContestError::InvalidParameter)` if the settings fail validation.
    pub fn new(settings: ContestSettings) -> Result<Self, ContestError> {
        settings.validate()?;

        let trace = Trace::new(settings.no_thin_time, settings.trace_max_time, settings.trace_capacity);
        let ruleset = Ruleset::new(settings.contest, &settings);

        Ok(ContestManager {
            settings,
            trace,
            ruleset,
            statistics: ContestStatistics::default(),
        })
    }

    pub fn settings(&self) -> &ContestSettings {
        &self.settings
    }

    pub fn contest(&self) -> ContestKind {
        self.ruleset.kind
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn statistics(&self) -> &ContestStatistics {
        &self.statistics
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Add a fix to the trace store.
    pub fn append(&mut self, fix: &Fix) {
        self.trace.append(fix);
    }

    /// Run one tick of every component.
    ///
    /// Arguments
    /// -----------------
    /// * `exhaustive` – Run every search to completion (e.g. when the flight has ended).
    ///
    /// Return
    /// ----------
    /// * `true` if the best result of any component improved.
    pub fn update_idle(&mut self, exhaustive: bool) -> bool {
        if self.trace.is_empty() {
            return false;
        }

        let mut improved = false;
        for index in 0..self.ruleset.components.len() {
            let (done, rest) = self.ruleset.components.split_at_mut(index);
            let component = &mut rest[0];

            match &mut component.policy {
                ContestPolicy::League(league) => {
                    if let Some(&input) = component.inputs.first() {
                        league.feed(done[input].policy.best_solution());
                    }
                }
                ContestPolicy::Composite(composite) => {
                    for (slot, &input) in component.inputs.iter().enumerate() {
                        let source = &done[input].policy;
                        composite.feed(slot, source.best_result(), source.best_solution());
                    }
                }
                ContestPolicy::Path(_) | ContestPolicy::Triangle(_) => {}
            }

            let before = component.policy.best_result().score;
            component.policy.solve(&self.trace, exhaustive);
            improved |= component.policy.best_result().score > before;
        }

        self.refresh_statistics();

        if improved {
            let best = self.statistics.best_result();
            info!(
                contest = %self.ruleset.kind,
                score = best.score,
                distance = best.distance,
                "contest result improved"
            );
        }
        improved
    }

    fn refresh_statistics(&mut self) {
        for (slot, component) in self.ruleset.slots.iter().enumerate() {
            let Some(policy) = component.map(|index| &self.ruleset.components[index].policy) else {
                continue;
            };
            self.statistics.result[slot] = policy.best_result();
            self.statistics.solution[slot] = policy.best_solution().iter().copied().collect();
        }
    }

    /// Clear the trace, every policy and the statistics.
    pub fn reset(&mut self) {
        self.trace.clear();
        for component in &mut self.ruleset.components {
            component.policy.reset();
        }
        self.statistics.reset();
    }

    /// Change the pilot handicap. Results start over unless the effective value is unchanged.
    pub fn set_handicap(&mut self, handicap: u32) {
        let unchanged = effective_handicap(self.settings.handicap) == effective_handicap(handicap);
        self.settings.handicap = handicap;
        if unchanged {
            return;
        }
        for component in &mut self.ruleset.components {
            component.policy.set_handicap(handicap);
        }
        self.statistics.reset();
    }

    pub fn set_incremental(&mut self, incremental: bool) {
        self.settings.incremental = incremental;
        for component in &mut self.ruleset.components {
            component.policy.set_incremental(incremental);
        }
    }

    /// Switch to another ruleset. The trace is kept; all results start over.
    pub fn set_contest(&mut self, contest: ContestKind) {
        if self.ruleset.kind == contest {
            return;
        }
        info!(from = %self.ruleset.kind, to = %contest, "switching contest ruleset");
        self.settings.contest = contest;
        self.ruleset = Ruleset::new(contest, &self.settings);
        self.statistics.reset();
    }

    /// Install or remove the predicted finish of the primary distance search.
    ///
    /// Ignored unless the settings enable `predict`. Components fed by the primary one are
    /// reset when the prediction changes.
    ///
    /// Return
    /// ----------
    /// * `true` if the prediction changed.
    pub fn set_predicted(&mut self, fix: Option<&Fix>) -> bool {
        if !self.settings.predict {
            return false;
        }
        let predicted = fix.copied();

        let Some(ContestPolicy::Path(primary)) = self.ruleset.components.first_mut().map(|c| &mut c.policy) else {
            return false;
        };
        if !primary.set_predicted(predicted) {
            return false;
        }

        debug!(predicted = predicted.is_some(), "prediction changed");
        for component in self.ruleset.components.iter_mut().filter(|c| c.is_dependent()) {
            component.policy.reset();
        }
        true
    }

    /// Work counters summed over every policy.
    pub fn counters(&self) -> SolveCounters {
        let mut total = SolveCounters::new();
        for component in &self.ruleset.components {
            total += component.policy.counters();
        }
        total
    }
}

#[cfg(test)]
mod manager_test {
    use super::*;
    use crate::geo::GeoPoint;
    use approx::assert_relative_eq;

    fn out_and_return_fixes() -> Vec<Fix> {
        let origin = GeoPoint::new(0.0, 0.0);
        vec![
            Fix::new(origin, 0, 1000.0),
            Fix::new(origin.offset_east(100_000.0), 3600, 1000.0),
            Fix::new(origin, 7200, 1000.0),
        ]
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut settings = ContestSettings::default();
        settings.trace_capacity = 2;
        assert!(matches!(ContestManager::new(settings), Err(ContestError::InvalidParameter(_))));
    }

    #[test]
    fn test_empty_trace_does_nothing() {
        let mut manager = ContestManager::new(ContestSettings::default()).unwrap();
        assert!(!manager.update_idle(true));
        assert!(manager.statistics().best_index().is_none());
    }

    #[test]
    fn test_out_and_return_slot() {
        let settings = ContestSettings::builder()
            .contest(ContestKind::DmstOutAndReturn)
            .build()
            .unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        for fix in out_and_return_fixes() {
            manager.append(&fix);
        }

        assert!(manager.update_idle(true));
        let result = manager.statistics().result[0];
        assert_relative_eq!(result.distance, 200_000.0, max_relative = 1e-6);
        assert_relative_eq!(result.score, 260.0, max_relative = 1e-6);
        assert_eq!(manager.statistics().solution[0].len(), 3);

        // nothing new
        assert!(!manager.update_idle(true));
    }

    #[test]
    fn test_handicap_and_contest_switch_reset_results() {
        let settings = ContestSettings::builder()
            .contest(ContestKind::DmstOutAndReturn)
            .build()
            .unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        for fix in out_and_return_fixes() {
            manager.append(&fix);
        }
        manager.update_idle(true);

        manager.set_handicap(130);
        assert!(manager.statistics().best_index().is_none());
        assert!(manager.update_idle(true));
        assert_relative_eq!(manager.statistics().result[0].score, 200.0, max_relative = 1e-6);

        manager.set_contest(ContestKind::OlcClassic);
        assert_eq!(manager.contest(), ContestKind::OlcClassic);
        assert_eq!(manager.trace().len(), 3);
        assert!(manager.statistics().best_index().is_none());
    }

    #[test]
    fn test_neutral_handicap_aliases_keep_results() {
        let settings = ContestSettings::builder()
            .contest(ContestKind::DmstOutAndReturn)
            .build()
            .unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        for fix in out_and_return_fixes() {
            manager.append(&fix);
        }
        manager.update_idle(true);
        let score = manager.statistics().result[0].score;

        manager.set_handicap(0);
        assert_eq!(manager.settings().handicap, 0);
        assert!(manager.statistics().best_index().is_some());

        manager.set_handicap(100);
        assert!(manager.statistics().best_index().is_some());
        assert_relative_eq!(manager.statistics().result[0].score, score);

        manager.set_handicap(120);
        assert!(manager.statistics().best_index().is_none());
    }

    #[test]
    fn test_prediction_needs_predict_setting() {
        let mut manager = ContestManager::new(ContestSettings::default()).unwrap();
        let fix = Fix::new(GeoPoint::new(0.0, 0.0), 100, 1000.0);
        manager.append(&Fix::new(GeoPoint::new(0.0, 0.0), 0, 1000.0));
        assert!(!manager.set_predicted(Some(&fix)));

        let settings = ContestSettings::builder().predict(true).build().unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        manager.append(&Fix::new(GeoPoint::new(0.0, 0.0), 0, 1000.0));
        assert!(manager.set_predicted(Some(&fix)));
        assert!(!manager.set_predicted(Some(&fix)));
        assert!(manager.set_predicted(None));
    }

    #[test]
    fn test_reset_clears_everything() {
        let settings = ContestSettings::builder()
            .contest(ContestKind::DmstOutAndReturn)
            .build()
            .unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        for fix in out_and_return_fixes() {
            manager.append(&fix);
        }
        manager.update_idle(true);
        assert!(manager.counters().solves > 0);

        manager.reset();
        assert!(manager.trace().is_empty());
        assert!(manager.statistics().best_index().is_none());
        assert_eq!(manager.counters(), SolveCounters::default());
    }
}
