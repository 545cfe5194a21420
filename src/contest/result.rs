use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    constants::{Meter, Second, METERS_PER_KM},
    trace::TracePoint,
};

/// Vertices of a scored path: start, turnpoints, finish.
pub type ContestTraceVector = SmallVec<[TracePoint; 10]>;

/// Number of result slots in [`ContestStatistics`].
pub const NUM_RESULT_SLOTS: usize = 3;

/// Score of a single ruleset component.
///
/// A zero `score` means "no result yet".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContestResult {
    pub score: f64,
    /// Scored distance in meters
    pub distance: Meter,
    /// Duration between start and finish
    pub time: Second,
}

impl ContestResult {
    pub fn new(score: f64, distance: Meter, time: Second) -> Self {
        ContestResult {
            score,
            distance,
            time,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.score > 0.0
    }

    pub fn distance_km(&self) -> f64 {
        self.distance / METERS_PER_KM
    }

    /// Average speed over the scored distance in m/s, 0 when the duration is unknown.
    pub fn speed(&self) -> f64 {
        if self.time == 0 {
            0.0
        } else {
            self.distance / f64::from(self.time)
        }
    }
}

/// Result slots exposed by the contest manager.
///
/// Slot 0 holds the primary distance component, slot 1 the triangle component and slot 2
/// the composite or league result. Single-component rulesets only fill slot 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContestStatistics {
    pub result: [ContestResult; NUM_RESULT_SLOTS],
    pub solution: [ContestTraceVector; NUM_RESULT_SLOTS],
}

impl ContestStatistics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Index of the defined slot with the highest score, or `None` if nothing is defined.
    ///
    /// On equal scores the lower slot wins.
    pub fn best_index(&self) -> Option<usize> {
        self.result
            .iter()
            .enumerate()
            .filter(|(_, result)| result.is_defined())
            .fold(None, |best: Option<(usize, f64)>, (i, result)| match best {
                Some((_, score)) if score >= result.score => best,
                _ => Some((i, result.score)),
            })
            .map(|(i, _)| i)
    }

    pub fn best_result(&self) -> ContestResult {
        self.best_index()
            .map(|i| self.result[i])
            .unwrap_or_default()
    }

    pub fn best_solution(&self) -> &[TracePoint] {
        match self.best_index() {
            Some(i) => &self.solution[i],
            None => &[],
        }
    }
}

#[cfg(test)]
mod result_test {
    use super::*;

    #[test]
    fn test_best_index_skips_undefined_slots() {
        let mut stats = ContestStatistics::default();
        assert_eq!(stats.best_index(), None);
        assert_eq!(stats.best_result(), ContestResult::default());
        assert!(stats.best_solution().is_empty());

        stats.result[1] = ContestResult::new(42.0, 42_000.0, 3600);
        stats.result[2] = ContestResult::new(40.0, 50_000.0, 3600);
        assert_eq!(stats.best_index(), Some(1));

        stats.result[0] = ContestResult::new(42.0, 42_000.0, 3000);
        assert_eq!(stats.best_index(), Some(0));
    }

    #[test]
    fn test_speed_handles_zero_duration() {
        assert_eq!(ContestResult::new(1.0, 1000.0, 0).speed(), 0.0);
        assert_eq!(ContestResult::new(1.0, 1000.0, 100).speed(), 10.0);
    }
}
