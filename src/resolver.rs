//! Stochastic resolver: independent probability trials over a generation.

use crate::config::TrialConfig;
use crate::error::{BlobError, Result};
use rand::Rng;

/// Draws one uniform number per trial from `[low, high]` and lets the
/// trial succeed when the draw does not exceed the probability.
///
/// With the default `low = 0.1` nothing below 0.1 ever succeeds; use
/// [`StochasticResolver::unit`] for plain `[0, 1]` semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticResolver {
    low: f64,
    high: f64,
}

impl Default for StochasticResolver {
    fn default() -> Self {
        Self { low: 0.1, high: 1.0 }
    }
}

impl StochasticResolver {
    /// Create a resolver drawing from `[low, high]`
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && 0.0 <= low && low <= high) {
            return Err(BlobError::InvalidConfiguration(format!(
                "trial range [{}, {}] must satisfy 0 <= low <= high",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    /// Create a resolver from the trial section of the configuration
    pub fn from_config(config: &TrialConfig) -> Result<Self> {
        Self::new(config.low, config.high)
    }

    /// Resolver over the full unit interval
    pub fn unit() -> Self {
        Self { low: 0.0, high: 1.0 }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    #[inline]
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low < self.high {
            rng.gen_range(self.low..=self.high)
        } else {
            self.low
        }
    }

    /// One trial against `probability`. Zero, negative and NaN always fail.
    pub fn trial<R: Rng + ?Sized>(&self, probability: f64, rng: &mut R) -> bool {
        let u = self.draw(rng);
        probability > 0.0 && u <= probability
    }

    /// Run one trial per member of `population`.
    ///
    /// Returns the members whose trial succeeded, in their original order,
    /// and a mask aligned with `population`. A member with no matching
    /// probability fails.
    pub fn apply_mask<T: Clone, R: Rng + ?Sized>(
        &self,
        population: &[T],
        probabilities: &[f64],
        rng: &mut R,
    ) -> (Vec<T>, Vec<bool>) {
        debug_assert_eq!(population.len(), probabilities.len());

        let mask: Vec<bool> = (0..population.len())
            .map(|i| {
                let p = probabilities.get(i).copied().unwrap_or(0.0);
                self.trial(p, rng)
            })
            .collect();

        let selected = filter_by_mask(population, &mask);
        (selected, mask)
    }
}

/// Keep the items whose mask entry is `true`
pub fn filter_by_mask<T: Clone>(items: &[T], mask: &[bool]) -> Vec<T> {
    items
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(item, _)| item.clone())
        .collect()
}

/// Plain Bernoulli draw on `[0, 1)`: 1.0 always succeeds, 0.0 never does
#[inline]
pub fn bernoulli<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    let u = rng.gen::<f64>();
    probability > 0.0 && u < probability
}
