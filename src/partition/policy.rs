use tracing::{debug, info};

use crate::domain::{Band, ParameterRegion, Partition, PartitionPolicy, Resolution};

/// Relative slack applied before `ceil`, so that an exact multiple such as
/// `0.1 / 0.01` is not pushed to the next integer by rounding noise.
const CEIL_TOLERANCE: f64 = 1e-9;

type Guard = fn(usize, usize) -> bool;

/// Ordered guards; the first match wins, `SkyResolved` otherwise.
const RULES: &[(Guard, PartitionPolicy)] = &[
    (sky_under_half_budget, PartitionPolicy::SpinDownSplit),
    (sky_over_budget, PartitionPolicy::SkyCapped),
];

fn sky_under_half_budget(sky_cells: usize, max_jobs: usize) -> bool {
    (sky_cells as f64) < max_jobs as f64 / 2.0
}

fn sky_over_budget(sky_cells: usize, max_jobs: usize) -> bool {
    sky_cells > max_jobs
}

/// Pick the partition policy for a resolution-limited sky cell count.
pub fn choose_policy(sky_cells: usize, max_jobs: usize) -> PartitionPolicy {
    RULES
        .iter()
        .find(|(guard, _)| guard(sky_cells, max_jobs))
        .map(|(_, policy)| *policy)
        .unwrap_or(PartitionPolicy::SkyResolved)
}

/// Number of `step`-wide cells needed to cover `width`.
///
/// A zero (or otherwise unusable) extent collapses to a single step.
pub fn resolution_limited_steps(width: f64, step: f64) -> usize {
    if !(width.is_finite() && step.is_finite() && width > 0.0 && step > 0.0) {
        return 1;
    }
    let steps = (width / step * (1.0 - CEIL_TOLERANCE)).ceil();
    (steps as usize).max(1)
}

/// Split the region into at most `max_jobs` cells.
pub fn partition(region: &ParameterRegion, resolution: &Resolution, max_jobs: usize) -> Partition {
    let max_jobs = max_jobs.max(1);
    let alpha_res = resolution_limited_steps(region.alpha.width(), resolution.angular);
    let delta_res = resolution_limited_steps(region.delta.width(), resolution.angular);
    let sky_cells = alpha_res * delta_res;

    let policy = choose_policy(sky_cells, max_jobs);
    let (alpha_steps, delta_steps, spindown_steps) = match policy {
        PartitionPolicy::SpinDownSplit => {
            (alpha_res, delta_res, split_steps(&region.f1, max_jobs / sky_cells, "spin-down"))
        }
        PartitionPolicy::SkyCapped => {
            let per_axis = ((max_jobs as f64).sqrt().floor() as usize).max(1);
            (
                split_steps(&region.alpha, per_axis, "alpha"),
                split_steps(&region.delta, per_axis, "delta"),
                1,
            )
        }
        PartitionPolicy::SkyResolved => (alpha_res, delta_res, 1),
    };

    let partition = Partition {
        policy,
        alpha_steps,
        delta_steps,
        spindown_steps,
        alpha_step: region.alpha.width() / alpha_steps as f64,
        delta_step: region.delta.width() / delta_steps as f64,
        spindown_step: region.f1.width() / spindown_steps as f64,
    };

    info!(
        policy = policy.display_name(),
        sky_cells,
        alpha_steps,
        delta_steps,
        spindown_steps,
        jobs = partition.job_count(),
        max_jobs,
        "partitioned parameter space"
    );
    partition
}

/// Steps along a dimension that is being split; zero-width bands stay whole.
fn split_steps(band: &Band, wanted: usize, name: &str) -> usize {
    if band.width() > 0.0 {
        wanted.max(1)
    } else {
        debug!(dimension = name, wanted, "zero-width band; keeping a single step");
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{angular_resolution, frequency_resolution, spindown_resolution};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn region(sky_width: f64, f1_width: f64) -> ParameterRegion {
        ParameterRegion {
            alpha: Band::from_width(1.0, sky_width),
            delta: Band::from_width(0.3, sky_width),
            f0: Band::from_width(100.0, 0.1),
            f1: Band::from_width(-1e-9, f1_width),
            f2: Band::point(0.0),
            f3: Band::point(0.0),
        }
    }

    fn resolution(region: &ParameterRegion, sky_templates: u64) -> Resolution {
        Resolution {
            angular: angular_resolution(&region.sky(), sky_templates).unwrap(),
            frequency: frequency_resolution(0.1, 86_400.0).unwrap(),
            spindown: spindown_resolution(0.1, 86_400.0).unwrap(),
            sky_templates,
        }
    }

    #[test]
    fn decision_table_order() {
        assert_eq!(choose_policy(100, 500), PartitionPolicy::SpinDownSplit);
        assert_eq!(choose_policy(249, 500), PartitionPolicy::SpinDownSplit);
        assert_eq!(choose_policy(250, 500), PartitionPolicy::SkyResolved);
        assert_eq!(choose_policy(500, 500), PartitionPolicy::SkyResolved);
        assert_eq!(choose_policy(501, 500), PartitionPolicy::SkyCapped);
        // Odd budgets compare against the real-valued half.
        assert_eq!(choose_policy(250, 501), PartitionPolicy::SpinDownSplit);
    }

    #[test]
    fn spare_budget_goes_to_spindown() {
        let region = region(0.1, 1e-9);
        let p = partition(&region, &resolution(&region, 100), 500);
        assert_eq!(p.policy, PartitionPolicy::SpinDownSplit);
        assert_eq!((p.alpha_steps, p.delta_steps, p.spindown_steps), (10, 10, 5));
        assert_eq!(p.job_count(), 500);
        assert!((p.alpha_step - 0.01).abs() < 1e-15);
        assert!((p.spindown_step - 2e-10).abs() < 1e-24);
    }

    #[test]
    fn oversized_sky_is_capped_evenly() {
        let region = region(0.1, 1e-9);
        let p = partition(&region, &resolution(&region, 10_000), 500);
        assert_eq!(p.policy, PartitionPolicy::SkyCapped);
        assert_eq!((p.alpha_steps, p.delta_steps, p.spindown_steps), (22, 22, 1));
        assert!((p.alpha_step * 22.0 - 0.1).abs() < 1e-15);
        assert!((p.spindown_step - 1e-9).abs() < 1e-24);
    }

    #[test]
    fn mid_range_sky_keeps_spindown_whole() {
        let region = region(0.1, 1e-9);
        let p = partition(&region, &resolution(&region, 300), 500);
        assert_eq!(p.policy, PartitionPolicy::SkyResolved);
        assert_eq!((p.alpha_steps, p.delta_steps, p.spindown_steps), (18, 18, 1));
        // Steps tile the band exactly and never exceed the resolution.
        assert!(p.alpha_step <= resolution(&region, 300).angular);
        assert!((p.alpha_step * 18.0 - 0.1).abs() < 1e-15);
    }

    #[test]
    fn uneven_band_uses_finer_steps_that_tile_it() {
        let region = region(0.1, 1e-9);
        let res = Resolution {
            angular: 0.03,
            ..resolution(&region, 100)
        };
        let p = partition(&region, &res, 500);
        assert_eq!((p.alpha_steps, p.delta_steps), (4, 4));
        assert!(p.alpha_step < res.angular);
        assert!((p.alpha_step - 0.025).abs() < 1e-15);
        assert!((p.delta_step * p.delta_steps as f64 - region.delta.width()).abs() < 1e-15);
    }

    #[test]
    fn zero_spindown_band_is_not_divided() {
        let region = region(0.1, 0.0);
        let p = partition(&region, &resolution(&region, 100), 500);
        assert_eq!(p.policy, PartitionPolicy::SpinDownSplit);
        assert_eq!(p.spindown_steps, 1);
        assert_eq!(p.spindown_step, 0.0);
        assert_eq!(p.job_count(), 100);
    }

    #[test]
    fn zero_extent_collapses_to_one_step() {
        assert_eq!(resolution_limited_steps(0.0, 0.01), 1);
        assert_eq!(resolution_limited_steps(0.1, 0.0), 1);
        assert_eq!(resolution_limited_steps(0.1, 0.01), 10);
        assert_eq!(resolution_limited_steps(0.105, 0.01), 11);
    }

    #[test]
    fn job_budget_is_never_exceeded() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let sky = rng.gen_range(1e-4..1.0);
            let f1 = if rng.gen_bool(0.2) { 0.0 } else { rng.gen_range(1e-12..1e-8) };
            let templates = rng.gen_range(1..50_000);
            let max_jobs = rng.gen_range(1..2_000);

            let region = region(sky, f1);
            let res = resolution(&region, templates);
            let p = partition(&region, &res, max_jobs);
            assert!(p.job_count() <= max_jobs, "{p:?} exceeds {max_jobs}");

            let alpha_res = resolution_limited_steps(region.alpha.width(), res.angular);
            let delta_res = resolution_limited_steps(region.delta.width(), res.angular);
            if (alpha_res * delta_res) as f64 <= max_jobs as f64 / 2.0 {
                assert_eq!((p.alpha_steps, p.delta_steps), (alpha_res, delta_res));
            }
        }
    }
}
