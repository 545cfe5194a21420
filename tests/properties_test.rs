use proptest::prelude::*;
use xcscore::constants::LARGE_TRIANGLE_DISTANCE;
use xcscore::contest::{ContestKind, ContestManager};
use xcscore::settings::ContestSettings;
use xcscore::solvers::{SolverResult, TriangleRules, TriangleSolver, TriangleSolverConfig};
use xcscore::trace::{Fix, Trace};

mod common;
use common::{fix_at, polygon_flight, trace_from, ALPS};

/// Fixes from relative steps `(north km, east km, seconds, altitude m)`.
fn walk(steps: &[(f64, f64, u32, f64)]) -> Vec<Fix> {
    let (mut north, mut east, mut time, mut altitude) = (0.0, 0.0, 0, 1500.0);
    steps
        .iter()
        .map(|&(dn, de, dt, dalt)| {
            north += dn;
            east += de;
            time += dt;
            altitude = f64::max(altitude + dalt, 100.0);
            fix_at(&ALPS, north, east, time, altitude)
        })
        .collect()
}

fn step_strategy() -> impl Strategy<Value = (f64, f64, u32, f64)> {
    (-3.0f64..3.0, -3.0f64..3.0, 2u32..90, -100.0f64..100.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Published scores never decrease while the flight goes on.
    #[test]
    fn prop_results_never_decrease(steps in prop::collection::vec(step_strategy(), 3..60)) {
        let settings = ContestSettings::builder()
            .contest(ContestKind::OlcPlus)
            .incremental(true)
            .build()
            .unwrap();
        let mut manager = ContestManager::new(settings).unwrap();

        let mut previous = [0.0; 3];
        for (i, fix) in walk(&steps).iter().enumerate() {
            manager.append(fix);
            manager.update_idle(i % 7 == 0);

            for (slot, result) in manager.statistics().result.iter().enumerate() {
                prop_assert!(result.score >= previous[slot], "slot {} dropped", slot);
                previous[slot] = result.score;
            }
        }
    }

    /// The store never exceeds its capacity and always keeps the first fix.
    #[test]
    fn prop_thinning_respects_capacity(
        steps in prop::collection::vec(step_strategy(), 20..300),
        max_size in 16usize..64,
        no_thin_time in 0u32..120,
    ) {
        let fixes = walk(&steps);
        let mut trace = Trace::new(no_thin_time, None, max_size);
        for fix in &fixes {
            trace.append(fix);
            prop_assert!(trace.len() <= max_size);
        }

        prop_assert_eq!(trace.front().map(|p| p.time), fixes.first().map(|f| f.time));
        prop_assert_eq!(trace.back().map(|p| p.time), fixes.last().map(|f| f.time));

        let times: Vec<_> = trace.iter().map(|p| p.time).collect();
        prop_assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Solving the same trace again changes nothing.
    #[test]
    fn prop_exhaustive_resolve_is_idempotent(steps in prop::collection::vec(step_strategy(), 3..40)) {
        let settings = ContestSettings::builder().contest(ContestKind::OlcPlus).build().unwrap();
        let mut manager = ContestManager::new(settings).unwrap();
        for fix in walk(&steps) {
            manager.append(&fix);
        }

        manager.update_idle(true);
        let first = manager.statistics().clone();
        prop_assert!(!manager.update_idle(true));
        prop_assert_eq!(manager.statistics(), &first);
    }

    /// Every FAI triangle found on a closed loop satisfies the leg-ratio rules.
    #[test]
    fn prop_fai_solutions_have_fai_shape(
        corners in prop::collection::vec((-30.0f64..30.0, -30.0f64..30.0), 3..6),
        n_points in 30usize..60,
    ) {
        let trace = trace_from(&polygon_flight(&ALPS, &corners, n_points, 60));
        check_fai_shape(&trace)?;
    }

    /// Same on loops long enough for the relaxed large-triangle ratios.
    #[test]
    fn prop_large_fai_solutions_have_fai_shape(
        side in 180.0f64..260.0,
        jitter in prop::collection::vec((-40.0f64..40.0, -40.0f64..40.0), 3),
        n_points in 30usize..60,
    ) {
        let h = side * 3f64.sqrt() / 2.0;
        let corners: Vec<(f64, f64)> = [(0.0, 0.0), (0.0, side), (h, side / 2.0)]
            .iter()
            .zip(&jitter)
            .map(|(&(n, e), &(dn, de))| (n + dn, e + de))
            .collect();
        let trace = trace_from(&polygon_flight(&ALPS, &corners, n_points, 60));
        check_fai_shape(&trace)?;
    }
}

/// Leg ratios of the best FAI triangle: 28 % below 500 km, 25 % and at most 45 % above.
fn check_fai_shape(trace: &Trace) -> Result<(), TestCaseError> {
    let mut solver = TriangleSolver::new(TriangleSolverConfig::new(TriangleRules::Fai));
    if solver.solve(trace, true) != SolverResult::Valid {
        return Ok(());
    }

    let solution = solver.solution().unwrap();
    let legs = solution.legs();
    let total: f64 = legs.iter().sum();
    let shortest = legs.iter().copied().fold(f64::INFINITY, f64::min);
    let longest = legs.iter().copied().fold(0.0, f64::max);

    // flat pre-checks and whole-meter truncation
    let slack = 0.002 * total;
    if total < LARGE_TRIANGLE_DISTANCE - slack {
        prop_assert!(shortest + slack >= 0.28 * total, "legs {:?}", legs);
    } else {
        prop_assert!(
            shortest + slack >= 0.25 * total && longest <= 0.45 * total + slack,
            "legs {:?}",
            legs
        );
    }
    prop_assert!(solution.gap <= 1010.0);
    Ok(())
}

#[test]
fn large_equilateral_triangle_uses_large_rules() {
    let trace = trace_from(&polygon_flight(
        &ALPS,
        &[(0.0, 0.0), (0.0, 200.0), (200.0 * 3f64.sqrt() / 2.0, 100.0)],
        60,
        60,
    ));
    let mut solver = TriangleSolver::new(TriangleSolverConfig::new(TriangleRules::Fai));
    assert_eq!(solver.solve(&trace, true), SolverResult::Valid);

    let total: f64 = solver.solution().unwrap().legs().iter().sum();
    assert!(total > LARGE_TRIANGLE_DISTANCE, "total {total}");
    check_fai_shape(&trace).unwrap();
}
