//! Scalar draws for the sampled (Monte Carlo) mode.

use super::{BoundedPareto, DistributionProvider, UncertainValue};
use crate::error::ProviderError;
use crate::rng::ForecastRng;

impl UncertainValue for f64 {
    #[inline]
    fn shift(self, offset: f64) -> Self {
        self + offset
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        self * factor
    }

    #[inline]
    fn sum_with(&self, other: &Self) -> Result<Self, ProviderError> {
        let sum = *self + *other;
        if sum.is_finite() {
            Ok(sum)
        } else {
            Err(ProviderError::NonFinite("scalar sum"))
        }
    }

    #[inline]
    fn mean(&self) -> f64 {
        *self
    }
}

/// Provider drawing one bounded Pareto variate per request.
///
/// # Examples
///
/// ```rust
/// use forecast_core::distribution::{DistributionProvider, SamplingProvider};
/// use forecast_core::rng::ForecastRng;
///
/// let mut provider = SamplingProvider::new(ForecastRng::from_seed(1));
/// let draw = provider.sample_bounded_pareto(1.05, 0.35, 1000.35).unwrap();
/// assert!((0.35..=1000.35).contains(&draw));
/// ```
pub struct SamplingProvider {
    rng: ForecastRng,
}

impl SamplingProvider {
    /// Creates a provider drawing from `rng`.
    #[inline]
    pub fn new(rng: ForecastRng) -> Self {
        Self { rng }
    }

    /// Replaces the generator, keeping the provider's allocation.
    #[inline]
    pub fn reseed(&mut self, rng: ForecastRng) {
        self.rng = rng;
    }

    /// Returns the underlying generator.
    #[inline]
    pub fn rng_mut(&mut self) -> &mut ForecastRng {
        &mut self.rng
    }
}

impl DistributionProvider for SamplingProvider {
    type Value = f64;

    fn sample_bounded_pareto(
        &mut self,
        alpha: f64,
        lower: f64,
        upper: f64,
    ) -> Result<Self::Value, ProviderError> {
        let pareto = BoundedPareto::new(alpha, lower, upper)?;
        if let Some(point) = pareto.point_mass() {
            return Ok(point);
        }
        Ok(pareto.sample(self.rng.gen_open01()))
    }
}
