use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use xcscore::contest::{ContestKind, ContestManager};
use xcscore::settings::ContestSettings;
use xcscore::trace::Fix;

mod common;
use common::{fix_at, random_walk, triangle_flight, ALPS};

fn run(contest: ContestKind, handicap: u32, fixes: &[Fix]) -> ContestManager {
    let settings = ContestSettings::builder()
        .contest(contest)
        .handicap(handicap)
        .build()
        .unwrap();
    let mut manager = ContestManager::new(settings).unwrap();
    for fix in fixes {
        manager.append(fix);
    }
    manager.update_idle(true);
    manager
}

#[test]
fn olc_plus_adds_classic_and_triangle() {
    let fixes = triangle_flight(&ALPS, 40.0, 60, 60);
    let manager = run(ContestKind::OlcPlus, 100, &fixes);
    let stats = manager.statistics();

    assert!(stats.result[0].is_defined());
    assert!(stats.result[1].is_defined());
    assert_relative_eq!(
        stats.result[2].score,
        stats.result[0].score + stats.result[1].score,
        max_relative = 1e-9
    );
    assert_eq!(stats.best_index(), Some(2));
}

#[test]
fn xcontest_picks_the_fai_triangle() {
    let fixes = triangle_flight(&ALPS, 30.0, 60, 60);
    let manager = run(ContestKind::XContest, 100, &fixes);
    let stats = manager.statistics();

    let triangle = stats.result[1];
    assert!(triangle.is_defined());
    assert_relative_eq!(triangle.score, 1.4 * triangle.distance_km(), max_relative = 1e-9);
    assert_relative_eq!(stats.result[2].score, triangle.score, max_relative = 1e-9);
    assert!(stats.result[0].score < triangle.score);
    assert_eq!(stats.solution[1].len(), 5);
}

#[test]
fn league_uses_classic_turnpoints() {
    let fixes: Vec<Fix> = (0..=24)
        .map(|i| {
            let t = i * 300;
            let east = if i <= 12 { f64::from(i) * 5.0 } else { f64::from(24 - i) * 5.0 };
            fix_at(&ALPS, f64::from(i), east, t, 1000.0 + f64::from(i) * 10.0)
        })
        .collect();
    let manager = run(ContestKind::OlcLeague, 100, &fixes);
    let stats = manager.statistics();

    assert!(stats.result[0].is_defined());
    assert!(stats.result[2].is_defined());
    assert_eq!(stats.solution[2].len(), 5);

    let league = &stats.solution[2];
    assert!(league.windows(2).all(|leg| leg[0].time <= leg[1].time));
    assert_eq!(league[4].time, 7200);
}

#[test]
fn zero_handicap_is_neutral() {
    let mut rng = StdRng::seed_from_u64(7);
    let fixes = random_walk(&mut rng, &ALPS, 80, 3.0);

    for contest in [ContestKind::OlcPlus, ContestKind::OlcLeague, ContestKind::XContest] {
        let neutral = run(contest, 100, &fixes);
        let zero = run(contest, 0, &fixes);
        assert_eq!(neutral.statistics(), zero.statistics(), "{contest}");
    }
}

#[test]
fn handicap_scales_distance_scores() {
    let fixes = triangle_flight(&ALPS, 30.0, 60, 60);
    let neutral = run(ContestKind::OlcClassic, 100, &fixes);
    let scaled = run(ContestKind::OlcClassic, 125, &fixes);

    let (a, b) = (neutral.statistics().result[0], scaled.statistics().result[0]);
    assert_relative_eq!(a.distance, b.distance, max_relative = 1e-9);
    assert_relative_eq!(b.score, a.score * 100.0 / 125.0, max_relative = 1e-9);
}

#[test]
fn every_contest_handles_a_random_flight() {
    let mut rng = StdRng::seed_from_u64(42);
    let fixes = random_walk(&mut rng, &ALPS, 60, 4.0);

    for contest in ContestKind::ALL {
        let manager = run(contest, 100, &fixes);
        for (slot, result) in manager.statistics().result.iter().enumerate() {
            assert!(result.score >= 0.0, "{contest} slot {slot}");
            if result.is_defined() {
                assert!(!manager.statistics().solution[slot].is_empty(), "{contest} slot {slot}");
            }
        }
    }
}
