//! Seeded sampling of distinct indices without replacement.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::warn;

/// How many indices to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountStrategy {
    /// Exactly this many.
    Exact(usize),
    /// This percentage of the population, rounded down.
    Percentage(f64),
}

/// Probability law for drawing indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDistribution {
    Uniform,
    /// Bell curve centred on the middle of the population.
    Normal,
}

impl fmt::Display for SampleDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleDistribution::Uniform => f.write_str("uniform"),
            SampleDistribution::Normal => f.write_str("normal"),
        }
    }
}

impl FromStr for SampleDistribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(SampleDistribution::Uniform),
            "normal" => Ok(SampleDistribution::Normal),
            other => Err(format!("unknown sample distribution: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

/// Normal parameters for a population of `population` indices.
///
/// Half the population spans one standard deviation, so the first and last
/// indices are drawn noticeably less often than the middle ones.
pub fn generate_normal_distribution(population: usize) -> NormalParams {
    const STD_COVER: f64 = 1.0;

    let n = population as f64;
    NormalParams {
        mean: (n - 1.0) / 2.0,
        std_dev: (n / 2.0) / STD_COVER,
    }
}

/// Resolve a count strategy against a population, clamping to the population.
pub fn sample_count(strategy: CountStrategy, population: usize) -> usize {
    let requested = match strategy {
        CountStrategy::Exact(n) => n,
        CountStrategy::Percentage(pct) => (pct / 100.0 * population as f64).floor() as usize,
    };
    clamp_count(requested, population)
}

fn clamp_count(requested: usize, population: usize) -> usize {
    if requested > population {
        warn!(requested, population, "Sample count exceeds population, clamping");
        population
    } else {
        requested
    }
}

/// Nearest integer to `x`; an exact tie goes to the lower integer.
pub fn nearest_index(x: f64) -> i64 {
    let floor = x.floor();
    let ceil = x.ceil();
    if ceil - x < x - floor {
        ceil as i64
    } else {
        floor as i64
    }
}

/// Draw `count` distinct indices in `0..population`, sorted ascending.
///
/// The same seed, distribution and sizes always give the same indices.
pub fn sample_indices(
    distribution: SampleDistribution,
    population: usize,
    count: usize,
    seed: u64,
) -> Vec<usize> {
    let count = clamp_count(count, population);
    if count == 0 {
        return Vec::new();
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    match distribution {
        SampleDistribution::Uniform => {
            let mut indices = index::sample(&mut rng, population, count).into_vec();
            indices.sort_unstable();
            indices
        }
        SampleDistribution::Normal => sample_normal(&mut rng, population, count),
    }
}

fn sample_normal(rng: &mut Xoshiro256PlusPlus, population: usize, count: usize) -> Vec<usize> {
    let params = generate_normal_distribution(population);
    // (-0.5, 0.5) -> 0, (0.5, 1.5) -> 1, ..., up to population - 1
    let lower = -0.5;
    let upper = population as f64 - 0.5;

    let mut picked = BTreeSet::new();
    while picked.len() < count {
        let z: f64 = rng.sample(StandardNormal);
        let x = params.mean + params.std_dev * z;
        if x <= lower || x >= upper {
            continue;
        }
        picked.insert(nearest_index(x) as usize);
    }
    picked.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(indices: &[usize], population: usize, count: usize) {
        assert_eq!(indices.len(), count);
        assert!(indices.windows(2).all(|w| w[0] < w[1]), "not strictly sorted: {indices:?}");
        assert!(indices.iter().all(|&i| i < population));
    }

    #[test]
    fn test_degenerate_normal() {
        let params = generate_normal_distribution(0);
        assert_eq!(params.mean, -0.5);
        assert_eq!(params.std_dev, 0.0);
    }

    #[test]
    fn test_normal_params() {
        let params = generate_normal_distribution(40);
        assert_eq!(params.mean, 19.5);
        assert_eq!(params.std_dev, 20.0);
    }

    #[test]
    fn test_sample_count_percentage() {
        assert_eq!(sample_count(CountStrategy::Percentage(20.0), 10), 2);
        assert_eq!(sample_count(CountStrategy::Percentage(10.0), 7), 0);
        assert_eq!(sample_count(CountStrategy::Percentage(100.0), 7), 7);
        assert_eq!(sample_count(CountStrategy::Percentage(250.0), 4), 4);
    }

    #[test]
    fn test_sample_count_exact_clamped() {
        assert_eq!(sample_count(CountStrategy::Exact(3), 10), 3);
        assert_eq!(sample_count(CountStrategy::Exact(30), 10), 10);
    }

    #[test]
    fn test_nearest_index_ties_go_low() {
        assert_eq!(nearest_index(2.5), 2);
        assert_eq!(nearest_index(2.51), 3);
        assert_eq!(nearest_index(2.49), 2);
        assert_eq!(nearest_index(-0.49), 0);
        assert_eq!(nearest_index(7.0), 7);
    }

    #[test]
    fn test_invariants_both_distributions() {
        for distribution in [SampleDistribution::Uniform, SampleDistribution::Normal] {
            for population in 0..25 {
                for count in 0..=population {
                    let indices = sample_indices(distribution, population, count, 42);
                    assert_valid(&indices, population, count);
                }
            }
        }
    }

    #[test]
    fn test_full_population() {
        for distribution in [SampleDistribution::Uniform, SampleDistribution::Normal] {
            let indices = sample_indices(distribution, 9, 9, 7);
            assert_eq!(indices, (0..9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_count_clamped() {
        let indices = sample_indices(SampleDistribution::Normal, 5, 12, 1);
        assert_valid(&indices, 5, 5);
    }

    #[test]
    fn test_reproducible() {
        for distribution in [SampleDistribution::Uniform, SampleDistribution::Normal] {
            let a = sample_indices(distribution, 60, 9, 1234);
            let b = sample_indices(distribution, 60, 9, 1234);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_normal_centred() {
        let draws: Vec<usize> = (0..500)
            .flat_map(|seed| sample_indices(SampleDistribution::Normal, 100, 1, seed))
            .collect();
        let mean = draws.iter().sum::<usize>() as f64 / draws.len() as f64;
        assert!((35.0..65.0).contains(&mean), "mean {mean}");
    }

    #[test]
    fn test_parse_distribution() {
        assert_eq!(
            "Normal".parse::<SampleDistribution>(),
            Ok(SampleDistribution::Normal)
        );
        assert_eq!(
            "uniform".parse::<SampleDistribution>(),
            Ok(SampleDistribution::Uniform)
        );
        assert!("gamma".parse::<SampleDistribution>().is_err());
    }
}
