//! # Bounded trace store with online thinning
//!
//! [`Trace`] keeps the flight history at reduced resolution. It behaves like an append-only,
//! time-ordered sequence, but once it reaches its capacity it removes the points whose absence
//! distorts the path the least; an online variant of Douglas–Peucker simplification.
//!
//! ## Elimination rank
//!
//! Each interior point `p` with neighbours `prev`/`next` is ranked by:
//!
//! ```text
//! elim_distance = | d(prev, p) + d(p, next) - d(prev, next) |   (flat units)
//! elim_time     = (next.t - prev.t) - min(next.t - p.t, p.t - prev.t)
//! ```
//!
//! Lower ranks are removed first; ties go to the point with the smaller `elim_time` (which
//! tends to even out the time steps), then to the older point. The first and the last point
//! carry a null rank and are never thinned.
//!
//! ## Storage
//!
//! ```text
//! Trace
//! ├── chronological : BTreeMap<time, TraceNode>        ordered by time (identity of a point)
//! └── ranks         : BTreeSet<(elim_d, elim_t, time)> ordered by elimination cost
//! ```
//!
//! Neighbour lookup is a range query on `chronological`, so no node holds a pointer to another.
//!
//! ## Serials
//!
//! * `append_serial` – bumped on every accepted fix.
//! * `modify_serial` – bumped on every structural change to existing data (clear, eviction,
//!   thinning, back-in-time repair).
//!
//! Solvers holding a snapshot compare both: an unchanged `modify_serial` means their copy is
//! still a prefix of the store and only the tail needs fetching.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    constants::{Meter, Second, BACKWARD_JUMP_LIMIT, MIN_SAMPLE_SPACING},
    geo::{FlatProjection, GeoPoint},
};

use super::{
    serial::Serial,
    trace_point::{Fix, TracePoint},
};

const NULL_DELTA: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DeltaRank {
    elim_distance: u32,
    elim_time: u32,
    time: Second,
}

#[derive(Debug, Clone, Copy)]
struct TraceNode {
    point: TracePoint,
    elim_distance: u32,
    elim_time: u32,
}

impl TraceNode {
    fn new(point: TracePoint) -> Self {
        TraceNode {
            point,
            elim_distance: NULL_DELTA,
            elim_time: NULL_DELTA,
        }
    }

    fn rank(&self) -> DeltaRank {
        DeltaRank {
            elim_distance: self.elim_distance,
            elim_time: self.elim_time,
            time: self.point.time,
        }
    }
}

/// Distance error introduced by removing `node` between `last` and `next`.
fn distance_metric(last: &TracePoint, node: &TracePoint, next: &TracePoint) -> u32 {
    let d_this = i64::from(last.flat_distance_to(node)) + i64::from(node.flat_distance_to(next));
    let d_rem = i64::from(last.flat_distance_to(next));
    (d_this - d_rem).unsigned_abs().min(u64::from(NULL_DELTA - 1)) as u32
}

/// Time error introduced by removing `node` between `last` and `next`.
fn time_metric(last: &TracePoint, node: &TracePoint, next: &TracePoint) -> u32 {
    (next.time - last.time) - (next.time - node.time).min(node.time - last.time)
}

/// Bounded, chronologically ordered store of trace points.
#[derive(Debug, Clone)]
pub struct Trace {
    chronological: BTreeMap<Second, TraceNode>,
    ranks: BTreeSet<DeltaRank>,
    projection: FlatProjection,

    no_thin_time: Second,
    max_time: Option<Second>,
    max_size: usize,
    opt_size: usize,

    append_serial: Serial,
    modify_serial: Serial,

    average_delta_time: u32,
    average_delta_distance: u32,
}

impl Trace {
    /// Create an empty trace.
    ///
    /// Arguments
    /// -----------------
    /// * `no_thin_time` – Seconds before the newest point within which the first thinning pass
    ///   never removes points.
    /// * `max_time` – Optional time window; points older than `latest - max_time` are evicted.
    /// * `max_size` – Capacity. Thinning brings the store back to three quarters of it.
    ///
    /// Panics
    /// ----------
    /// * If `max_size < 3`: the two endpoints are never thinned, so the store could not make
    ///   room for a new point.
    pub fn new(no_thin_time: Second, max_time: Option<Second>, max_size: usize) -> Self {
        assert!(max_size >= 3, "trace capacity must be at least 3 points");

        Trace {
            chronological: BTreeMap::new(),
            ranks: BTreeSet::new(),
            projection: FlatProjection::default(),
            no_thin_time,
            max_time,
            max_size,
            opt_size: (max_size * 3 / 4).max(2),
            append_serial: Serial::new(),
            modify_serial: Serial::new(),
            average_delta_time: 0,
            average_delta_distance: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chronological.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chronological.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_time(&self) -> Option<Second> {
        self.max_time
    }

    pub fn no_thin_time(&self) -> Second {
        self.no_thin_time
    }

    pub fn append_serial(&self) -> Serial {
        self.append_serial
    }

    pub fn modify_serial(&self) -> Serial {
        self.modify_serial
    }

    /// Mean time step between non-recent points, refreshed after each thinning.
    pub fn average_delta_time(&self) -> u32 {
        self.average_delta_time
    }

    /// Mean flat distance between non-recent points, refreshed after each thinning.
    pub fn average_delta_distance(&self) -> u32 {
        self.average_delta_distance
    }

    pub fn projection(&self) -> &FlatProjection {
        &self.projection
    }

    /// Flat-unit equivalent of `distance` meters around `location`.
    pub fn project_range(&self, location: &GeoPoint, distance: Meter) -> u32 {
        self.projection.project_range(location, distance)
    }

    pub fn front(&self) -> Option<&TracePoint> {
        self.chronological.values().next().map(|node| &node.point)
    }

    pub fn back(&self) -> Option<&TracePoint> {
        self.chronological.values().next_back().map(|node| &node.point)
    }

    /// Points in chronological order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TracePoint> + '_ {
        self.chronological.values().map(|node| &node.point)
    }

    /// Full chronological copy of the store.
    pub fn points(&self) -> Vec<TracePoint> {
        self.iter().copied().collect()
    }

    /// Chronological copy of the points at or after `min_time`.
    pub fn points_since(&self, min_time: Second) -> Vec<TracePoint> {
        self.chronological
            .range(min_time..)
            .map(|(_, node)| node.point)
            .collect()
    }

    /// Append to `dest` the points newer than its last element.
    ///
    /// `dest` must be a copy taken from this store while `modify_serial` had its current value;
    /// otherwise the result is a mix of two histories. An empty `dest` receives everything.
    ///
    /// Return
    /// ----------
    /// * `true` if at least one point was appended.
    pub fn sync_points(&self, dest: &mut Vec<TracePoint>) -> bool {
        let before = dest.len();
        match dest.last().map(|point| point.time) {
            None => dest.extend(self.iter().copied()),
            Some(last_time) => dest.extend(
                self.chronological
                    .range((Excluded(last_time), Unbounded))
                    .map(|(_, node)| node.point),
            ),
        }
        dest.len() > before
    }

    /// Remove every point and forget the projection origin.
    pub fn clear(&mut self) {
        self.chronological.clear();
        self.ranks.clear();
        self.average_delta_time = 0;
        self.average_delta_distance = 0;
        self.modify_serial.increment();
    }

    /// Add a fix to the store.
    ///
    /// * A fix less than [`MIN_SAMPLE_SPACING`] after the newest point is ignored.
    /// * A fix slightly in the past evicts the conflicting tail; one more than
    ///   [`BACKWARD_JUMP_LIMIT`] in the past is taken as a restarted stream and clears the store.
    /// * The first point of an empty store becomes the projection origin.
    /// * The time window is enforced, then the store is thinned if it is full.
    pub fn append(&mut self, fix: &Fix) {
        if let Some(back_time) = self.back().map(|point| point.time) {
            if fix.time < back_time {
                if fix.time.saturating_add(BACKWARD_JUMP_LIMIT) < back_time {
                    debug!(
                        fix_time = fix.time,
                        back_time, "fix stream jumped back in time, clearing trace"
                    );
                    self.clear();
                } else {
                    trace!(fix_time = fix.time, back_time, "evicting trace tail");
                    self.erase_from(fix.time);
                }
            }
        }

        if let Some(back) = self.back() {
            if fix.time < back.time.saturating_add(MIN_SAMPLE_SPACING) {
                return;
            }
        }

        self.enforce_time_window(fix.time);

        if self.is_empty() {
            self.projection.reset(fix.location);
        }

        if self.len() >= self.max_size {
            self.thin();
        }

        let point = TracePoint::from_fix(fix, &self.projection);
        let previous_back = self.back().map(|p| p.time);

        let node = TraceNode::new(point);
        self.ranks.insert(node.rank());
        self.chronological.insert(point.time, node);

        if let Some(time) = previous_back {
            self.update_delta(time);
        }

        self.append_serial.increment();
    }

    /// Evict every point older than `time`.
    ///
    /// Return
    /// ----------
    /// * `true` if something was removed.
    pub fn erase_earlier_than(&mut self, time: Second) -> bool {
        let kept = self.chronological.split_off(&time);
        let removed = std::mem::replace(&mut self.chronological, kept);
        if removed.is_empty() {
            return false;
        }

        for node in removed.values() {
            self.ranks.remove(&node.rank());
        }
        if let Some(&first) = self.chronological.keys().next() {
            self.update_delta(first);
        }
        self.modify_serial.increment();
        true
    }

    /// Evict every point at or after `time`.
    fn erase_from(&mut self, time: Second) -> bool {
        let removed = self.chronological.split_off(&time);
        if removed.is_empty() {
            return false;
        }

        for node in removed.values() {
            self.ranks.remove(&node.rank());
        }
        if let Some(&last) = self.chronological.keys().next_back() {
            self.update_delta(last);
        }
        self.modify_serial.increment();
        true
    }

    fn enforce_time_window(&mut self, time: Second) {
        if let Some(max_time) = self.max_time {
            if time > max_time {
                self.erase_earlier_than(time - max_time);
            }
        }
    }

    /// Reduce the store to three quarters of its capacity.
    ///
    /// The first pass spares the `no_thin_time` window before the newest point; if that is not
    /// enough a second pass ignores the window. The endpoints always survive.
    pub fn thin(&mut self) {
        let before = self.len();

        self.erase_delta(self.opt_size, self.no_thin_time);
        if self.len() > self.opt_size {
            self.erase_delta(self.opt_size, 0);
        }

        self.update_averages();
        self.modify_serial.increment();

        debug!(
            before,
            after = self.len(),
            average_delta_time = self.average_delta_time,
            average_delta_distance = self.average_delta_distance,
            "thinned trace"
        );
    }

    /// Time after which points are considered recent.
    fn recent_time(&self, window: Second) -> Second {
        self.back()
            .map(|back| back.time.saturating_sub(window))
            .unwrap_or(0)
    }

    fn erase_delta(&mut self, target_size: usize, recent: Second) -> bool {
        if self.len() < 3 {
            return false;
        }

        let recent_time = self.recent_time(recent);
        let mut modified = false;

        while self.len() > target_size {
            let candidate = self
                .ranks
                .iter()
                .take_while(|rank| rank.elim_distance != NULL_DELTA)
                .find(|rank| rank.time < recent_time)
                .map(|rank| rank.time);

            match candidate {
                Some(time) => {
                    self.erase_inside(time);
                    modified = true;
                }
                // only endpoints or recent points left
                None => break,
            }
        }
        modified
    }

    fn erase_inside(&mut self, time: Second) {
        let Some(node) = self.chronological.remove(&time) else {
            return;
        };
        self.ranks.remove(&node.rank());

        let previous = self.chronological.range(..time).next_back().map(|(&t, _)| t);
        let next = self.chronological.range(time..).next().map(|(&t, _)| t);

        if let Some(t) = previous {
            self.update_delta(t);
        }
        if let Some(t) = next {
            self.update_delta(t);
        }
    }

    /// Recompute the elimination rank of the point at `time` from its current neighbours.
    fn update_delta(&mut self, time: Second) {
        let previous = self
            .chronological
            .range(..time)
            .next_back()
            .map(|(_, node)| node.point);
        let next = self
            .chronological
            .range((Excluded(time), Unbounded))
            .next()
            .map(|(_, node)| node.point);

        let Some(node) = self.chronological.get_mut(&time) else {
            return;
        };
        self.ranks.remove(&node.rank());

        match (previous, next) {
            (Some(previous), Some(next)) => {
                node.elim_distance = distance_metric(&previous, &node.point, &next);
                node.elim_time = time_metric(&previous, &node.point, &next);
            }
            _ => {
                node.elim_distance = NULL_DELTA;
                node.elim_time = NULL_DELTA;
            }
        }

        self.ranks.insert(node.rank());
    }

    fn update_averages(&mut self) {
        let recent_time = self.recent_time(self.no_thin_time);

        let (sum_distance, sum_time, count) = self
            .iter()
            .tuple_windows()
            .filter(|(_, point)| point.time < recent_time)
            .fold((0u64, 0u64, 0u64), |(d, t, n), (previous, point)| {
                (
                    d + u64::from(previous.flat_distance_to(point)),
                    t + u64::from(point.time - previous.time),
                    n + 1,
                )
            });

        if count > 0 {
            self.average_delta_distance = (sum_distance / count) as u32;
            self.average_delta_time = (sum_time / count) as u32;
        } else {
            self.average_delta_distance = 0;
            self.average_delta_time = 0;
        }
    }
}
