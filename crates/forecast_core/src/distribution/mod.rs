//! Uncertain values and the distribution providers that create them.
//!
//! The engine never inspects how an uncertain value is represented. It only
//! relies on the capabilities declared here:
//!
//! ```text
//! UncertainValue          shift, scale, sum_with, mean
//! └── DistributionalQuery probability_greater_than, quantile, support
//!
//! DistributionProvider    sample_bounded_pareto -> Value
//! ├── ParticleProvider    Value = ParticleDistribution (distributional mode)
//! └── SamplingProvider    Value = f64                  (sampled mode)
//! ```
//!
//! A pipeline is generic over one provider, so distributional and sampled
//! values can never be mixed within a run. Scalars do not implement
//! [`DistributionalQuery`]: asking a single draw for a quantile is rejected
//! at compile time, and asking a Monte Carlo result for one is rejected at
//! run time with [`ForecastError::UnsupportedQuery`](crate::error::ForecastError).

mod pareto;
mod particle;
mod sampled;

pub use pareto::BoundedPareto;
pub use particle::{bin_masses, Particle, ParticleDistribution, ParticleProvider};
pub use sampled::SamplingProvider;

use crate::error::ProviderError;

/// A quantity carrying uncertainty through the portfolio pipeline.
///
/// Sums must be associative and commutative in result semantics; the
/// floating-point result may still depend on summation order.
pub trait UncertainValue: Clone + Send + Sync + Sized {
    /// Adds a constant to the value.
    fn shift(self, offset: f64) -> Self;

    /// Multiplies the value by a constant.
    fn scale(self, factor: f64) -> Self;

    /// Sum of two independent uncertain values.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::NonFinite` if the sum overflows.
    fn sum_with(&self, other: &Self) -> Result<Self, ProviderError>;

    /// Expected value (the value itself for a scalar draw).
    fn mean(&self) -> f64;
}

/// Pointwise queries available on a full distribution.
pub trait DistributionalQuery: UncertainValue {
    /// Probability that the value is strictly greater than `threshold`.
    ///
    /// Always in [0, 1].
    fn probability_greater_than(&self, threshold: f64) -> f64;

    /// Value below which a probability mass `p` falls.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidProbability` unless `0 < p < 1`.
    fn quantile(&self, p: f64) -> Result<f64, ProviderError>;

    /// Closed interval containing all probability mass.
    fn support(&self) -> (f64, f64);
}

/// Source of bounded Pareto uncertain values.
pub trait DistributionProvider {
    /// Representation produced by this provider.
    type Value: UncertainValue;

    /// Creates a bounded Pareto value with shape `alpha` on `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` unless `alpha` is positive and finite and
    /// `0 <= lower <= upper` with both bounds finite.
    fn sample_bounded_pareto(
        &mut self,
        alpha: f64,
        lower: f64,
        upper: f64,
    ) -> Result<Self::Value, ProviderError>;
}
