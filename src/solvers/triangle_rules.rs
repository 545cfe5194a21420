//! # Triangle shape rules
//!
//! Leg-ratio constraints used by the triangle solver, in two flavours:
//!
//! * **feasibility** – on bounding-box bounds of whole candidate sets, relaxed so that flat
//!   projection and rounding errors never discard a close positive;
//! * **integrality** – on a single concrete triangle, first with cheap flat checks and then,
//!   for marginal shapes only, with geodesic distances.
//!
//! FAI rules: the shortest leg must be at least 28 % of the perimeter, or 25 % for
//! perimeters of 500 km and more; the longest leg may not exceed 45 %.
//! Flat triangles have no shape constraint.

use serde::{Deserialize, Serialize};

use crate::{
    constants::{LARGE_TRIANGLE_DISTANCE, LARGE_TRIANGLE_RELAXED_DISTANCE},
    geo::{FlatProjection, GeoPoint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriangleRules {
    /// Any closed triangle
    Flat,
    /// FAI leg-ratio rules
    Fai,
}

/// Geodesic check of a concrete triangle against the FAI rules.
///
/// Leg lengths are truncated to whole meters.
pub fn is_fai_triangle(d_12: f64, d_23: f64, d_31: f64) -> bool {
    let (d_12, d_23, d_31) = (d_12 as u64, d_23 as u64, d_31 as u64);
    let total = d_12 + d_23 + d_31;

    let shortest = d_12.min(d_23).min(d_31);
    if shortest * 25 >= total * 7 {
        return true;
    }

    let longest = d_12.max(d_23).max(d_31);
    if longest * 20 > total * 9 {
        return false;
    }

    total >= LARGE_TRIANGLE_DISTANCE as u64 && shortest * 4 >= total
}

/// Rules bound to the projection of one search.
#[derive(Debug, Clone, Copy)]
pub struct TriangleValidator {
    rules: TriangleRules,
    /// Flat equivalent of the relaxed large-triangle threshold
    large_triangle_check: u64,
}

impl TriangleValidator {
    pub fn new(rules: TriangleRules, projection: &FlatProjection, location: &GeoPoint) -> Self {
        TriangleValidator {
            rules,
            large_triangle_check: u64::from(projection.project_range(location, LARGE_TRIANGLE_RELAXED_DISTANCE)),
        }
    }

    pub fn rules(&self) -> TriangleRules {
        self.rules
    }

    /// Upper bound of the perimeter given the summed maximal leg bounds.
    ///
    /// Under FAI rules the perimeter is also at most four times the shortest leg.
    pub fn upper_bound(&self, sum_max: u32, shortest_max: u32) -> u32 {
        match self.rules {
            TriangleRules::Flat => sum_max,
            TriangleRules::Fai => sum_max.min(shortest_max.saturating_mul(4)),
        }
    }

    /// Whether a candidate set with these bounds may contain a valid triangle.
    pub fn is_feasible(&self, df_min: u32, df_max: u32, shortest_max: u32, longest_min: u32) -> bool {
        if self.rules == TriangleRules::Flat {
            return true;
        }
        let (df_min, df_max) = (u64::from(df_min), u64::from(df_max));
        let (shortest_max, longest_min) = (u64::from(shortest_max), u64::from(longest_min));

        // shortest leg at least 27.5 % (small) or 24.3 % (large)
        if (df_max > self.large_triangle_check && shortest_max * 37 < df_min * 9)
            || (df_max <= self.large_triangle_check && shortest_max * 40 < df_min * 11)
        {
            return false;
        }

        // longest leg at most 47 %
        longest_min * 19 <= df_max * 9
    }

    /// Whether a concrete triangle satisfies the rules.
    ///
    /// Arguments
    /// -----------------
    /// * `df_max` – Flat perimeter bound of the (singleton) candidate.
    /// * `shortest_max`, `longest_max` – Flat shortest and longest leg.
    /// * `vertices` – Geodesic locations, used only when the flat checks are inconclusive.
    pub fn is_integral(&self, df_max: u32, shortest_max: u32, longest_max: u32, vertices: [&GeoPoint; 3]) -> bool {
        if self.rules == TriangleRules::Flat {
            return true;
        }
        let df_max = u64::from(df_max);
        let (shortest_max, longest_max) = (u64::from(shortest_max), u64::from(longest_max));

        // shortest at least 28.2 %
        if shortest_max * 39 >= df_max * 11 {
            return true;
        }
        // longest above 45.8 %
        if longest_max * 24 > df_max * 11 {
            return false;
        }
        // small triangle with shortest below 27.5 %
        if df_max < self.large_triangle_check && shortest_max * 40 < df_max * 11 {
            return false;
        }

        let [tp1, tp2, tp3] = vertices;
        is_fai_triangle(tp1.distance(tp2), tp2.distance(tp3), tp3.distance(tp1))
    }
}
