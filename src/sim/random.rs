//! Injectable randomness for the simulators.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Provider of every random draw the engine makes.
pub trait RandomSource {
    /// Uniform real in `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Uniform integer in `[low, high]`.
    fn uniform_int(&mut self, low: i64, high: i64) -> i64;

    /// `true` with probability `p`.
    fn bernoulli(&mut self, p: f64) -> bool;

    /// Uniform real in `[low, high]` rounded to two decimals, the resolution
    /// dashboard readings are published at.
    fn reading(&mut self, low: f64, high: f64) -> f64 {
        round2(self.uniform(low, high))
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// [`RandomSource`] backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seeded for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is given, from OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }
}

/// Replays queued draws in order, one queue per draw kind.
///
/// Scripted values are clamped into the requested range. Once a queue runs
/// dry, reals and integers fall back to the lower bound and flips to `false`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    reals: VecDeque<f64>,
    ints: VecDeque<i64>,
    flips: VecDeque<bool>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reals(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.reals.extend(values);
        self
    }

    pub fn with_ints(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.ints.extend(values);
        self
    }

    pub fn with_flips(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.flips.extend(values);
        self
    }

    /// Number of scripted draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.reals.len() + self.ints.len() + self.flips.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.reals
            .pop_front()
            .map_or(low, |v| v.clamp(low, high.max(low)))
    }

    fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        self.ints
            .pop_front()
            .map_or(low, |v| v.clamp(low, high.max(low)))
    }

    fn bernoulli(&mut self, _p: f64) -> bool {
        self.flips.pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_matches_dashboard_resolution() {
        assert_eq!(round2(470.588_235), 470.59);
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-2.344), -2.34);
    }

    #[test]
    fn std_random_stays_in_bounds() {
        let mut rng = StdRandom::seeded(7);
        for _ in 0..1_000 {
            let x = rng.uniform(49.8, 50.2);
            assert!((49.8..=50.2).contains(&x));
            let n = rng.uniform_int(800, 1800);
            assert!((800..=1800).contains(&n));
            let r = rng.reading(0.85, 0.98);
            assert!((0.85..=0.98).contains(&r));
        }
    }

    #[test]
    fn std_random_is_deterministic_for_seed() {
        let mut a = StdRandom::seeded(42);
        let mut b = StdRandom::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
            assert_eq!(a.bernoulli(0.3), b.bernoulli(0.3));
        }
    }

    #[test]
    fn degenerate_range_returns_low() {
        let mut rng = StdRandom::seeded(1);
        assert_eq!(rng.uniform(5.0, 5.0), 5.0);
        assert_eq!(rng.uniform_int(3, 3), 3);
    }

    #[test]
    fn bernoulli_extremes() {
        let mut rng = StdRandom::seeded(3);
        assert!((0..100).all(|_| !rng.bernoulli(0.0)));
        assert!((0..100).all(|_| rng.bernoulli(1.0)));
    }

    #[test]
    fn scripted_replays_then_falls_back() {
        let mut rng = ScriptedRandom::new()
            .with_reals([200.0, 999.0])
            .with_ints([500])
            .with_flips([true]);
        assert_eq!(rng.remaining(), 4);
        assert_eq!(rng.uniform(50.0, 300.0), 200.0);
        assert_eq!(rng.uniform(400.0, 450.0), 450.0);
        assert_eq!(rng.uniform(1.0, 2.0), 1.0);
        assert_eq!(rng.uniform_int(400, 600), 500);
        assert_eq!(rng.uniform_int(400, 600), 400);
        assert!(rng.bernoulli(0.5));
        assert!(!rng.bernoulli(0.5));
        assert_eq!(rng.remaining(), 0);
    }
}
