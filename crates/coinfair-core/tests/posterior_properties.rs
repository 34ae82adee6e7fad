use coinfair_core::grid::BiasGrid;
use coinfair_core::posterior::Posterior;
use coinfair_core::prior::Prior;
use coinfair_core::sweep::ConvergenceSweep;
use coinfair_core::toss::{Counts, TossGenerator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn posterior(heads: u64, tails: u64, prior: Prior) -> Posterior {
    Posterior::compute(Counts::new(heads, tails), &BiasGrid::standard(), &prior)
        .expect("posterior computes")
}

#[test]
fn generator_conserves_counts_for_random_inputs() {
    let mut params = StdRng::seed_from_u64(20251019);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let pheads: f64 = params.gen_range(0.0..=1.0);
        let n: usize = params.gen_range(0..400);
        let seq = TossGenerator::new(pheads).unwrap().simulate(n, &mut rng);
        assert_eq!(seq.len(), n);
        assert_eq!(seq.heads() + seq.tails(), n as u64);
        assert!(seq.outcomes().iter().all(|t| t.as_u8() <= 1));
    }
}

#[test]
fn density_sums_to_one_for_many_counts() {
    for heads in [0u64, 1, 3, 10, 99, 500, 3000] {
        for tails in [0u64, 2, 7, 50, 1000] {
            for prior in [Prior::Uniform, Prior::default_gaussian()] {
                let post = posterior(heads, tails, prior);
                let sum: f64 = post.density().iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-9,
                    "({heads}, {tails}, {prior}) sums to {sum}"
                );
            }
        }
    }
}

#[test]
fn uniform_map_tracks_frequency() {
    let step = BiasGrid::standard().step();
    for (heads, tails) in [(50, 50), (80, 20), (30, 70), (5, 5), (1, 3)] {
        let expected = heads as f64 / (heads + tails) as f64;
        let map = posterior(heads, tails, Prior::Uniform).map_estimate();
        assert!(
            (map - expected).abs() <= step,
            "MAP {map} vs {expected} for ({heads}, {tails})"
        );
    }
}

#[test]
fn gaussian_prior_pulls_toward_half() {
    for (heads, tails) in [(80, 20), (20, 80), (7, 3), (1, 0), (0, 10), (300, 200)] {
        let uniform = posterior(heads, tails, Prior::Uniform).map_estimate();
        let gaussian = posterior(heads, tails, Prior::default_gaussian()).map_estimate();
        assert!(
            (gaussian - 0.5).abs() < (uniform - 0.5).abs(),
            "gaussian {gaussian} not closer to 0.5 than uniform {uniform}"
        );
    }
}

#[test]
fn swapping_heads_and_tails_mirrors_the_density() {
    for (heads, tails) in [(3, 9), (80, 20), (0, 10), (1, 0)] {
        let forward = posterior(heads, tails, Prior::Uniform);
        let backward = posterior(tails, heads, Prior::Uniform);
        let reversed: Vec<f64> = backward.density().iter().rev().copied().collect();
        for (a, b) in forward.density().iter().zip(&reversed) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }
}

#[test]
fn gaussian_prior_alone_is_symmetric() {
    let post = posterior(0, 0, Prior::default_gaussian());
    let density = post.density();
    let n = density.len();
    for i in 0..n / 2 {
        assert!((density[i] - density[n - 1 - i]).abs() < 1e-9);
    }
}

#[test]
fn boundary_scenarios() {
    let grid = BiasGrid::standard();
    assert_eq!(posterior(0, 10, Prior::Uniform).map_estimate(), grid.lower());
    assert_eq!(posterior(10, 0, Prior::Uniform).map_estimate(), grid.upper());
}

#[test]
fn balanced_counts_land_on_a_central_point() {
    let grid = BiasGrid::standard();
    let map = posterior(5, 5, Prior::Uniform).map_estimate();
    assert!((map - 0.5).abs() < grid.step());

    // An odd-sized symmetric grid contains 0.5 itself.
    let odd = BiasGrid::linspace(1e-6, 1.0 - 1e-6, 501).unwrap();
    let post = Posterior::compute(Counts::new(5, 5), &odd, &Prior::Uniform).unwrap();
    assert!((post.map_estimate() - 0.5).abs() < 1e-9);
}

#[test]
fn sweep_sharpens_with_more_tosses() {
    let sweep = ConvergenceSweep::new(0.7, 4096).unwrap();
    let mut rng = StdRng::seed_from_u64(77);
    let result = sweep
        .run(&mut rng, &BiasGrid::standard(), &[Prior::Uniform])
        .unwrap();
    let steps = result.steps();
    let first = steps.first().unwrap().posteriors[0].max_density();
    let last = steps.last().unwrap().posteriors[0].max_density();
    assert!(last > first);
    let map = steps.last().unwrap().posteriors[0].map_estimate();
    assert!((map - 0.7).abs() < 0.05, "MAP {map} after 4096 tosses");
}

#[test]
fn seeded_sweeps_are_reproducible() {
    let sweep = ConvergenceSweep::new(0.4, 256).unwrap();
    let priors = [Prior::Uniform, Prior::default_gaussian()];
    let a = sweep
        .run(&mut StdRng::seed_from_u64(9), &BiasGrid::standard(), &priors)
        .unwrap();
    let b = sweep
        .run(&mut StdRng::seed_from_u64(9), &BiasGrid::standard(), &priors)
        .unwrap();
    assert_eq!(a, b);
}
