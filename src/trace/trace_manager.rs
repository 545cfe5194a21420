//! # Solver-private trace snapshots
//!
//! Solvers never hold references into the [`Trace`] store: thinning may remove any interior
//! point at any time. Instead each solver owns a [`TraceManager`], a copy of the store that
//! is refreshed explicitly:
//!
//! * **full resync** – the store's `modify_serial` changed (or no copy was taken yet); the
//!   snapshot is rebuilt and every index previously handed out is void.
//! * **tail resync** – only `append_serial` changed; new points are appended and existing
//!   indices stay valid.
//!
//! An optional *predicted* point (a synthetic finish the pilot has not reached yet) is kept
//! as the last snapshot element when it is newer than the last real point.

use crate::constants::Second;

use super::{serial::Serial, trace_point::TracePoint, trace_store::Trace};

#[derive(Debug, Clone, Default)]
pub struct TraceManager {
    points: Vec<TracePoint>,
    predicted: Option<TracePoint>,
    /// `true` when the last element of `points` is the predicted point
    has_predicted: bool,
    append_serial: Option<Serial>,
    modify_serial: Option<Serial>,
}

impl TraceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the snapshot; the next update is a full resync.
    pub fn clear(&mut self) {
        self.points.clear();
        self.has_predicted = false;
        self.append_serial = None;
        self.modify_serial = None;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &TracePoint {
        &self.points[index]
    }

    pub fn last(&self) -> Option<&TracePoint> {
        self.points.last()
    }

    pub fn predicted(&self) -> Option<&TracePoint> {
        self.predicted.as_ref()
    }

    /// Replace the predicted finish point.
    ///
    /// Return
    /// ----------
    /// * `true` if the prediction changed; the snapshot is then marked for a full resync.
    pub fn set_predicted(&mut self, predicted: Option<TracePoint>) -> bool {
        if self.predicted == predicted {
            return false;
        }
        self.predicted = predicted;
        self.modify_serial = None;
        true
    }

    /// Whether the store changed structurally since the last full resync.
    pub fn is_modified(&self, trace: &Trace) -> bool {
        self.modify_serial != Some(trace.modify_serial())
    }

    /// Whether the store received new points since the last resync.
    pub fn is_appended(&self, trace: &Trace) -> bool {
        self.append_serial != Some(trace.append_serial())
    }

    /// Decide whether the snapshot is stale enough to justify a full resync.
    ///
    /// Any structural change requires one. Continuous solvers extend their snapshot through
    /// [`TraceManager::update_tail`] and never need more. Others resync while the snapshot is
    /// shorter than `min_points`, and otherwise only when the store's newest point is farther
    /// away, in time and in distance, than the store's average step.
    pub fn is_master_updated(&self, trace: &Trace, continuous: bool, min_points: usize) -> bool {
        if self.is_modified(trace) {
            return true;
        }
        if continuous {
            return false;
        }
        if self.real_len() < min_points {
            return true;
        }

        let (Some(last_master), Some(last)) = (trace.back(), self.last_real()) else {
            return true;
        };

        last_master.time > last.time.saturating_add(trace.average_delta_time())
            && last_master.flat_distance_to(last) > trace.average_delta_distance()
    }

    /// Rebuild the snapshot from the store.
    pub fn update_full(&mut self, trace: &Trace) {
        self.points.clear();
        self.points.reserve(trace.max_size() + 1);
        self.points.extend(trace.iter().copied());
        self.has_predicted = false;
        self.push_predicted();

        self.append_serial = Some(trace.append_serial());
        self.modify_serial = Some(trace.modify_serial());
    }

    /// Append the points the store received since the last resync.
    ///
    /// Must only be called while `is_modified` is `false`.
    ///
    /// Return
    /// ----------
    /// * `true` if at least one real point was appended.
    pub fn update_tail(&mut self, trace: &Trace) -> bool {
        debug_assert!(!self.is_modified(trace));

        self.pop_predicted();
        let appended = trace.sync_points(&mut self.points);
        self.push_predicted();

        self.append_serial = Some(trace.append_serial());
        appended
    }

    fn real_len(&self) -> usize {
        self.points.len() - usize::from(self.has_predicted)
    }

    fn last_real(&self) -> Option<&TracePoint> {
        self.points[..self.real_len()].last()
    }

    fn last_real_time(&self) -> Option<Second> {
        self.last_real().map(|point| point.time)
    }

    fn pop_predicted(&mut self) {
        if self.has_predicted {
            self.points.pop();
            self.has_predicted = false;
        }
    }

    fn push_predicted(&mut self) {
        let Some(predicted) = self.predicted else {
            return;
        };
        if self
            .last_real_time()
            .map_or(true, |time| predicted.time > time)
        {
            self.points.push(predicted);
            self.has_predicted = true;
        }
    }
}
