//! Investment return construction and portfolio aggregation.
//!
//! Each investment returns a bounded Pareto multiple on `[x_min, x_max + x_min]`.
//! Shifting by `-x_min` moves the support to `[0, x_max]`, so the lower bound
//! stands for a total loss, and scaling by `1 / N` splits the normalised
//! capital evenly. The portfolio return is the independent sum of the `N`
//! scaled values and therefore also lives on `[0, x_max]`.

use tracing::trace;

use crate::config::SimulationParameters;
use crate::distribution::{DistributionProvider, UncertainValue};
use crate::error::{ForecastError, Result};

/// Fills `buffer` with one return per investment.
///
/// The buffer is cleared first and holds exactly
/// `params.number_of_investments()` values afterwards, in investment order.
/// Its allocation is reused across calls.
///
/// # Errors
///
/// - `ForecastError::Allocation` if the buffer cannot grow to `N` entries
/// - `ForecastError::Provider` if the provider rejects a request
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::SimulationParameters;
/// use forecast_core::distribution::{DistributionalQuery, ParticleProvider};
/// use forecast_core::portfolio::load_investment_returns;
///
/// let params = SimulationParameters::builder()
///     .number_of_investments(4)
///     .build()
///     .unwrap();
/// let mut provider = ParticleProvider::new(32).unwrap();
/// let mut returns = Vec::new();
///
/// load_investment_returns(&params, &mut provider, &mut returns).unwrap();
/// assert_eq!(returns.len(), 4);
/// assert_eq!(returns[0].support().0, 0.0);
/// ```
pub fn load_investment_returns<P: DistributionProvider>(
    params: &SimulationParameters,
    provider: &mut P,
    buffer: &mut Vec<P::Value>,
) -> Result<()> {
    let count = params.number_of_investments();
    buffer.clear();
    buffer
        .try_reserve_exact(count)
        .map_err(|_| ForecastError::allocation("investment returns", count))?;

    let alpha = params.alpha();
    let x_min = params.x_min();
    let upper = params.pareto_upper_bound();
    let weight = params.per_investment_value();

    for _ in 0..count {
        let value = provider.sample_bounded_pareto(alpha, x_min, upper)?;
        buffer.push(value.shift(-x_min).scale(weight));
    }

    trace!(count, "loaded investment returns");
    Ok(())
}

/// Sums investment returns in index order.
///
/// # Errors
///
/// - `ForecastError::EmptyPortfolio` for an empty slice
/// - `ForecastError::Provider` if a partial sum is not finite
pub fn portfolio_return<V: UncertainValue>(returns: &[V]) -> Result<V> {
    let (first, rest) = returns.split_first().ok_or(ForecastError::EmptyPortfolio)?;
    rest.iter()
        .try_fold(first.clone(), |total, value| total.sum_with(value))
        .map_err(ForecastError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{
        BoundedPareto, DistributionalQuery, ParticleDistribution, ParticleProvider,
        SamplingProvider,
    };
    use crate::error::ProviderError;
    use crate::rng::ForecastRng;
    use approx::assert_relative_eq;

    fn params(n: usize, x_min: f64, x_max: f64) -> SimulationParameters {
        SimulationParameters::builder()
            .number_of_investments(n)
            .x_min(x_min)
            .x_max(x_max)
            .build()
            .unwrap()
    }

    /// Provider that fails on every request.
    struct FailingProvider;

    impl DistributionProvider for FailingProvider {
        type Value = f64;

        fn sample_bounded_pareto(
            &mut self,
            alpha: f64,
            _lower: f64,
            _upper: f64,
        ) -> std::result::Result<f64, ProviderError> {
            Err(ProviderError::InvalidShape(alpha))
        }
    }

    #[test]
    fn test_loads_exactly_n_values() {
        let params = params(7, 0.35, 1000.0);
        let mut provider = SamplingProvider::new(ForecastRng::from_seed(1));
        let mut buffer = vec![123.0; 20];

        load_investment_returns(&params, &mut provider, &mut buffer).unwrap();
        assert_eq!(buffer.len(), 7);
        for &value in &buffer {
            assert!(value >= 0.0 && value <= 1000.0 / 7.0 + 1e-12);
        }
    }

    #[test]
    fn test_provider_error_propagates() {
        let params = params(3, 0.35, 1000.0);
        let mut buffer = Vec::new();
        let err = load_investment_returns(&params, &mut FailingProvider, &mut buffer).unwrap_err();
        assert!(matches!(err, ForecastError::Provider(ProviderError::InvalidShape(_))));
    }

    #[test]
    fn test_shift_then_scale_support() {
        let params = params(10, 0.35, 1000.0);
        let mut provider = ParticleProvider::new(16).unwrap();
        let mut buffer = Vec::new();

        load_investment_returns(&params, &mut provider, &mut buffer).unwrap();
        for value in &buffer {
            let (lower, upper) = value.support();
            assert_eq!(lower, 0.0);
            assert_relative_eq!(upper, 100.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_x_min_matches_direct_construction() {
        let params = params(1, 0.0, 500.0);
        let mut provider = ParticleProvider::new(64).unwrap();
        let mut buffer = Vec::new();
        load_investment_returns(&params, &mut provider, &mut buffer).unwrap();

        let direct = ParticleDistribution::from_bounded_pareto(
            &BoundedPareto::new(params.alpha(), 0.0, 500.0).unwrap(),
            64,
        )
        .unwrap();
        assert_eq!(buffer[0], direct);
    }

    #[test]
    fn test_portfolio_return_of_single_value() {
        let value = ParticleDistribution::point(0.7, 8);
        let total = portfolio_return(std::slice::from_ref(&value)).unwrap();
        assert_eq!(total, value);
    }

    #[test]
    fn test_portfolio_return_sums_scalars() {
        assert_eq!(portfolio_return(&[0.25, 0.5, 1.0]).unwrap(), 1.75);
    }

    #[test]
    fn test_empty_portfolio_is_rejected() {
        let empty: [f64; 0] = [];
        assert!(matches!(
            portfolio_return(&empty),
            Err(ForecastError::EmptyPortfolio)
        ));
    }

    #[test]
    fn test_portfolio_support_is_zero_to_x_max() {
        let params = params(25, 0.35, 1000.0);
        let mut provider = ParticleProvider::new(32).unwrap();
        let mut buffer = Vec::new();
        load_investment_returns(&params, &mut provider, &mut buffer).unwrap();

        let total = portfolio_return(&buffer).unwrap();
        let (lower, upper) = total.support();
        assert_eq!(lower, 0.0);
        assert_relative_eq!(upper, 1000.0, max_relative = 1e-12);
    }
}
