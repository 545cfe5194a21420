#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::Rng;

use xcscore::constants::Second;
use xcscore::geo::GeoPoint;
use xcscore::trace::{Fix, Trace};

pub const ALPS: GeoPoint = GeoPoint {
    latitude: 46.0,
    longitude: 8.0,
};

/// Fix `north_km`/`east_km` away from `origin`.
pub fn fix_at(origin: &GeoPoint, north_km: f64, east_km: f64, time: Second, altitude: f64) -> Fix {
    let location = origin.offset_north(north_km * 1000.0).offset_east(east_km * 1000.0);
    Fix::new(location, time, altitude)
}

/// Closed flight along the polygon `corners` (km north, km east), `n_points` fixes evenly
/// spread over the perimeter plus a final fix back on the first corner.
pub fn polygon_flight(origin: &GeoPoint, corners: &[(f64, f64)], n_points: usize, step: Second) -> Vec<Fix> {
    let mut closed = corners.to_vec();
    closed.push(corners[0]);

    let lengths: Vec<f64> = closed
        .windows(2)
        .map(|leg| (leg[1].0 - leg[0].0).hypot(leg[1].1 - leg[0].1))
        .collect();
    let perimeter: f64 = lengths.iter().sum();

    let mut fixes = Vec::with_capacity(n_points + 1);
    for k in 0..n_points {
        let mut along = perimeter * k as f64 / n_points as f64;
        let mut leg = 0;
        while leg + 1 < lengths.len() && along > lengths[leg] {
            along -= lengths[leg];
            leg += 1;
        }
        let f = if lengths[leg] > 0.0 { along / lengths[leg] } else { 0.0 };
        let (n0, e0) = closed[leg];
        let (n1, e1) = closed[leg + 1];
        fixes.push(fix_at(
            origin,
            n0 + (n1 - n0) * f,
            e0 + (e1 - e0) * f,
            k as Second * step,
            1000.0,
        ));
    }
    fixes.push(fix_at(origin, corners[0].0, corners[0].1, n_points as Second * step, 1000.0));
    fixes
}

/// Equilateral triangle flight with `side_km` legs.
pub fn triangle_flight(origin: &GeoPoint, side_km: f64, n_points: usize, step: Second) -> Vec<Fix> {
    let h = side_km * 3f64.sqrt() / 2.0;
    polygon_flight(origin, &[(0.0, 0.0), (0.0, side_km), (h, side_km / 2.0)], n_points, step)
}

/// Random walk of `n` fixes with steps of up to `max_step_km` and 10 to 60 seconds.
pub fn random_walk(rng: &mut StdRng, origin: &GeoPoint, n: usize, max_step_km: f64) -> Vec<Fix> {
    let (mut north, mut east, mut altitude) = (0.0, 0.0, 1500.0);
    let mut time: Second = 0;

    (0..n)
        .map(|_| {
            let fix = fix_at(origin, north, east, time, altitude);
            north += rng.random_range(-max_step_km..=max_step_km);
            east += rng.random_range(-max_step_km..=max_step_km);
            altitude = (altitude + rng.random_range(-150.0..=150.0f64)).max(200.0);
            time += rng.random_range(10..=60);
            fix
        })
        .collect()
}

pub fn trace_from(fixes: &[Fix]) -> Trace {
    let mut trace = Trace::new(0, None, 1024);
    for fix in fixes {
        trace.append(fix);
    }
    trace
}
