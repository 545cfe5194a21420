use thiserror::Error;

/// Errors raised while configuring the contest engine.
///
/// Solving itself never fails with an error: insufficient data, rule violations
/// and exhausted budgets are reported through
/// [`SolverResult`](crate::solvers::SolverResult) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContestError {
    #[error("Invalid contest parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown contest ruleset: {0}")]
    UnknownContest(String),
}
