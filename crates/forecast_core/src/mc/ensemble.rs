//! Monte Carlo ensemble storage and reduction.

use crate::error::{ForecastError, Result};

/// Running mean and variance (Welford's online algorithm).
///
/// Numerically stable for long streams whose values share a large offset.
///
/// # Examples
///
/// ```rust
/// use forecast_core::mc::RunningMoments;
///
/// let mut moments = RunningMoments::new();
/// for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     moments.update(x);
/// }
/// assert_eq!(moments.mean(), 5.0);
/// assert!((moments.variance() - 32.0 / 7.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation.
    #[inline]
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sample mean (0 when empty).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance with `n - 1` denominator (0 for fewer than two values).
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }
}

/// Mean and variance of a reduced ensemble.
///
/// The summary only knows two moments. Tail questions are rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnsembleSummary {
    /// Number of draws.
    pub len: usize,
    /// Sample mean of the draws.
    pub mean: f64,
    /// Sample variance of the draws.
    pub variance: f64,
}

impl EnsembleSummary {
    /// Standard error of the mean.
    pub fn standard_error(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        (self.variance / self.len as f64).sqrt()
    }

    /// Always fails: a two-moment summary has no tail probabilities.
    ///
    /// # Errors
    ///
    /// Always returns `ForecastError::UnsupportedQuery`.
    pub fn probability_greater_than(&self, _threshold: f64) -> Result<f64> {
        Err(ForecastError::unsupported_in_sampled_mode("probability"))
    }

    /// Always fails: a two-moment summary has no quantiles.
    ///
    /// # Errors
    ///
    /// Always returns `ForecastError::UnsupportedQuery`.
    pub fn quantile(&self, _p: f64) -> Result<f64> {
        Err(ForecastError::unsupported_in_sampled_mode("quantile"))
    }
}

/// Portfolio return draws of a Monte Carlo run, one slot per iteration.
///
/// The slot array is allocated once at its final length; iteration `i`
/// writes only slot `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloEnsemble {
    draws: Vec<f64>,
}

impl MonteCarloEnsemble {
    /// Allocates `iterations` zeroed slots.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Allocation` if the slots cannot be reserved.
    pub fn with_len(iterations: usize) -> Result<Self> {
        let mut draws = Vec::new();
        draws
            .try_reserve_exact(iterations)
            .map_err(|_| ForecastError::allocation("Monte Carlo ensemble", iterations))?;
        draws.resize(iterations, 0.0);
        Ok(Self { draws })
    }

    /// Wraps already collected draws.
    pub fn from_draws(draws: Vec<f64>) -> Self {
        Self { draws }
    }

    /// Returns the draws in iteration order.
    #[inline]
    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [f64] {
        &mut self.draws
    }

    /// Number of draws.
    #[inline]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Returns `true` if the ensemble holds no draws.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Reduces the draws, in iteration order, to mean and sample variance.
    pub fn summary(&self) -> EnsembleSummary {
        let moments = self.draws.iter().fold(RunningMoments::new(), |mut m, &x| {
            m.update(x);
            m
        });
        EnsembleSummary {
            len: moments.count(),
            mean: moments.mean(),
            variance: moments.variance(),
        }
    }

    /// Always fails: an ensemble is reduced to moments only.
    ///
    /// # Errors
    ///
    /// Always returns `ForecastError::UnsupportedQuery`.
    pub fn probability_greater_than(&self, _threshold: f64) -> Result<f64> {
        Err(ForecastError::unsupported_in_sampled_mode("probability"))
    }

    /// Always fails: an ensemble is reduced to moments only.
    ///
    /// # Errors
    ///
    /// Always returns `ForecastError::UnsupportedQuery`.
    pub fn quantile(&self, _p: f64) -> Result<f64> {
        Err(ForecastError::unsupported_in_sampled_mode("quantile"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moments_match_closed_form() {
        // 1..=n has mean (n+1)/2 and sample variance n(n+1)/12
        let n = 1000;
        let ensemble = MonteCarloEnsemble::from_draws((1..=n).map(|x| x as f64).collect());
        let summary = ensemble.summary();

        assert_eq!(summary.len, n);
        assert_relative_eq!(summary.mean, (n as f64 + 1.0) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            summary.variance,
            (n * (n + 1)) as f64 / 12.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_moments_stable_with_large_offset() {
        let offset = 1e9;
        let ensemble =
            MonteCarloEnsemble::from_draws(vec![offset + 4.0, offset + 7.0, offset + 13.0, offset + 16.0]);
        let summary = ensemble.summary();
        assert_relative_eq!(summary.mean, offset + 10.0, epsilon = 1e-6);
        assert_relative_eq!(summary.variance, 30.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_draw_has_zero_variance() {
        let summary = MonteCarloEnsemble::from_draws(vec![3.5]).summary();
        assert_eq!(summary.len, 1);
        assert_eq!(summary.mean, 3.5);
        assert_eq!(summary.variance, 0.0);
        assert_eq!(summary.standard_error(), 0.0);
    }

    #[test]
    fn test_with_len_is_zeroed() {
        let ensemble = MonteCarloEnsemble::with_len(5).unwrap();
        assert_eq!(ensemble.draws(), &[0.0; 5]);
        assert!(!ensemble.is_empty());
    }

    #[test]
    fn test_queries_are_unsupported() {
        let ensemble = MonteCarloEnsemble::from_draws(vec![1.0, 2.0]);
        assert!(matches!(
            ensemble.quantile(0.5),
            Err(ForecastError::UnsupportedQuery { query: "quantile", .. })
        ));
        assert!(matches!(
            ensemble.probability_greater_than(1.0),
            Err(ForecastError::UnsupportedQuery { query: "probability", .. })
        ));

        let summary = ensemble.summary();
        assert!(summary.quantile(0.99).is_err());
        assert!(summary.probability_greater_than(1.0).is_err());
    }
}
