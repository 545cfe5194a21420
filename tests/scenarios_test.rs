use approx::assert_relative_eq;
use xcscore::contest::{Contest, ContestKind, ContestManager, PathContest, PathScoring};
use xcscore::settings::ContestSettings;
use xcscore::solvers::{
    PathSolver, PathSolverConfig, SolverResult, TriangleRules, TriangleSolver, TriangleSolverConfig, TriangleTuning,
};
use xcscore::trace::Trace;

mod common;
use common::{fix_at, trace_from, triangle_flight, ALPS};

fn manager_for(contest: ContestKind) -> ContestManager {
    let settings = ContestSettings::builder().contest(contest).build().unwrap();
    ContestManager::new(settings).unwrap()
}

#[test]
fn out_and_return_with_bonus() {
    let fixes = vec![
        fix_at(&ALPS, 0.0, 0.0, 0, 1000.0),
        fix_at(&ALPS, 0.0, 100.0, 3600, 1000.0),
        fix_at(&ALPS, 0.0, 0.0, 7200, 1000.0),
    ];
    let trace = trace_from(&fixes);

    let config = PathSolverConfig::new(2).max_closing_distance(1000.0);
    let mut policy = PathContest::new(PathSolver::new(config), PathScoring::new(1.0).bonus(0.3));
    assert_eq!(policy.solve(&trace, true), SolverResult::Valid);

    let result = policy.best_result();
    assert_relative_eq!(result.distance, 200_000.0, max_relative = 1e-3);
    assert_relative_eq!(result.score, 260.0, max_relative = 1e-3);
    assert_eq!(result.time, 7200);
    assert_eq!(policy.best_solution().len(), 3);

    let mut manager = manager_for(ContestKind::DmstOutAndReturn);
    for fix in &fixes {
        manager.append(fix);
    }
    assert!(manager.update_idle(true));
    let slot = manager.statistics().result[0];
    assert_relative_eq!(slot.distance, result.distance, max_relative = 1e-9);
    assert_relative_eq!(slot.score, result.score, max_relative = 1e-9);
}

#[test]
fn single_fix_scores_nothing() {
    let fixes = vec![fix_at(&ALPS, 0.0, 0.0, 0, 800.0)];
    let trace = trace_from(&fixes);

    let mut solver = PathSolver::new(PathSolverConfig::new(6));
    assert_eq!(solver.solve(&trace, true), SolverResult::Failed);
    assert!(solver.solution().is_none());

    let mut manager = manager_for(ContestKind::OlcClassic);
    manager.append(&fixes[0]);
    assert!(!manager.update_idle(true));
    assert_eq!(manager.statistics().result[0].score, 0.0);
    assert!(manager.statistics().best_solution().is_empty());
}

#[test]
fn predictive_triangle_converges_to_exhaustive_result() {
    let trace = trace_from(&triangle_flight(&ALPS, 25.0, 48, 30));

    let mut exhaustive = TriangleSolver::new(TriangleSolverConfig::new(TriangleRules::Fai).predict(true));
    assert_eq!(exhaustive.solve(&trace, true), SolverResult::Valid);

    let mut stepped = TriangleSolver::new(TriangleSolverConfig::new(TriangleRules::Fai).predict(true));
    stepped.set_tuning(TriangleTuning {
        tick_iteration_divisor: 10_000,
        ..TriangleTuning::default()
    });

    let mut incomplete = 0;
    let result = loop {
        match stepped.solve(&trace, false) {
            SolverResult::Incomplete => {
                assert!(stepped.is_running());
                incomplete += 1;
            }
            other => break other,
        }
    };

    assert_eq!(result, SolverResult::Valid);
    assert!(incomplete >= 2, "only {incomplete} suspended ticks");
    assert!(!stepped.is_running());
    assert_eq!(stepped.solution(), exhaustive.solution());
}

#[test]
fn time_window_keeps_recent_points() {
    let mut trace = Trace::new(0, Some(600), 1024);
    for time in (0..=1190).step_by(10) {
        trace.append(&fix_at(&ALPS, f64::from(time) / 100.0, 0.0, time, 1000.0));
    }

    assert_eq!(trace.len(), 61);
    assert!(trace.front().unwrap().time >= 590);
    assert_eq!(trace.back().unwrap().time, 1190);

    let times: Vec<_> = trace.iter().map(|point| point.time).collect();
    assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
}
