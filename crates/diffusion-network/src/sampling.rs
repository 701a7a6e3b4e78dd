//! Shared randomness helpers: weighted selection and bounded rejection.
//!
//! Every strategy receives its generator explicitly, so these helpers are
//! generic over `R: Rng + ?Sized` and work with `&mut dyn RngCore` as well
//! as concrete seeded generators.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::NetworkError;

/// Default number of draws a rejection loop may make before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Bernoulli trial: `true` with probability `p`; values outside `[0, 1]` saturate.
///
/// `p == 1.0` always succeeds and `p == 0.0` never does.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}

/// Uniformly pick one element of a slice.
pub fn pick<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Option<T> {
    items.choose(rng).copied()
}

/// Upper bound on draws for a rejection-sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max_attempts: u32,
}

impl RetryBudget {
    /// Create a budget of `max_attempts` draws (at least one).
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Maximum number of draws.
    pub const fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    /// Call `draw` until it yields a candidate or the budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoFeasibleTarget`] once `max_attempts` draws
    /// have all been rejected.
    pub fn sample<T, R: Rng + ?Sized>(
        self,
        strategy: &'static str,
        rng: &mut R,
        mut draw: impl FnMut(&mut R) -> Option<T>,
    ) -> Result<T, NetworkError> {
        for _ in 0..self.max_attempts {
            if let Some(found) = draw(rng) {
                return Ok(found);
            }
        }
        Err(NetworkError::NoFeasibleTarget {
            strategy,
            attempts: self.max_attempts,
        })
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// A discrete distribution over indices built from unnormalized weights.
///
/// Negative and non-finite weights count as zero. Indices with zero weight
/// are never drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeDistribution {
    cumulative: Vec<f64>,
    total: f64,
    last_positive: usize,
}

impl CumulativeDistribution {
    /// Normalize `weights` into a cumulative distribution.
    ///
    /// Returns `None` when no weight is positive.
    pub fn new(weights: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut cumulative = Vec::new();
        let mut total = 0.0_f64;
        let mut last_positive = None;
        for (index, weight) in weights.into_iter().enumerate() {
            if weight.is_finite() && weight > 0.0 {
                total += weight;
                last_positive = Some(index);
            }
            cumulative.push(total);
        }
        let last_positive = last_positive?;
        if !total.is_finite() {
            return None;
        }
        Some(Self {
            cumulative,
            total,
            last_positive,
        })
    }

    /// Draw an index with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u = rng.random::<f64>() * self.total;
        let index = self.cumulative.partition_point(|&c| c <= u);
        index.min(self.last_positive)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn all_zero_weights_yield_no_distribution() {
        assert!(CumulativeDistribution::new([0.0, 0.0]).is_none());
        assert!(CumulativeDistribution::new([-1.0, f64::NAN]).is_none());
        assert!(CumulativeDistribution::new(std::iter::empty()).is_none());
    }

    #[test]
    fn zero_weight_index_is_never_drawn() {
        let dist = CumulativeDistribution::new([1.0, 0.0, 3.0]).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..5_000 {
            assert_ne!(dist.sample(&mut rng), 1);
        }
    }

    #[test]
    fn draws_follow_weights() {
        let dist = CumulativeDistribution::new([1.0, 3.0]).unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        let trials = 20_000_u32;
        let mut heavy = 0_u32;
        for _ in 0..trials {
            if dist.sample(&mut rng) == 1 {
                heavy += 1;
            }
        }
        let share = f64::from(heavy) / f64::from(trials);
        assert!((share - 0.75).abs() < 0.02, "heavy share was {share}");
    }

    #[test]
    fn retry_budget_reports_exhaustion() {
        let mut rng = SmallRng::seed_from_u64(1);
        let result: Result<u32, _> = RetryBudget::new(5).sample("test", &mut rng, |_| None);
        assert_eq!(
            result,
            Err(NetworkError::NoFeasibleTarget {
                strategy: "test",
                attempts: 5
            })
        );
        let mut calls = 0_u32;
        let found = RetryBudget::default().sample("test", &mut rng, |_| {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(found, Ok(3));
    }

    #[test]
    fn chance_extremes_are_exact() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert!((0..1_000).all(|_| chance(&mut rng, 1.0)));
        assert!((0..1_000).all(|_| !chance(&mut rng, 0.0)));
    }
}
