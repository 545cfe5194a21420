//! Search engines behind the scoring policies.
//!
//! * [`dijkstra`] – generic multi-stage graph search.
//! * [`path_solver`] – best weighted path through the trace.
//! * [`triangle_solver`] – branch-and-bound search for the best closed triangle, with its
//!   helpers [`closing_pairs`], [`quad_tree`] and [`triangle_rules`].

pub mod closing_pairs;
pub mod dijkstra;
pub mod path_solver;
pub mod quad_tree;
pub mod triangle_rules;
pub mod triangle_solver;

use serde::{Deserialize, Serialize};

pub use path_solver::{PathSolution, PathSolver, PathSolverConfig};
pub use triangle_rules::TriangleRules;
pub use triangle_solver::{TriangleSolution, TriangleSolver, TriangleSolverConfig, TriangleTuning};

/// Outcome of one solver tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverResult {
    /// A solution was produced this tick
    Valid,
    /// No solution: too little data, nothing new, or no admissible shape
    Failed,
    /// The search was suspended and continues on the next tick
    Incomplete,
}
