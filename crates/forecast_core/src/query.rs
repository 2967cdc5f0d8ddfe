//! Distributional queries on a portfolio return.

use tracing::debug;

use crate::config::{SimulationParameters, TOTAL_INVESTMENT};
use crate::distribution::DistributionalQuery;
use crate::error::Result;
use crate::result::SimulationResult;

/// Answers the loss and quantile questions for one portfolio distribution.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::SimulationParameters;
/// use forecast_core::distribution::ParticleDistribution;
/// use forecast_core::query::QueryEvaluator;
///
/// let params = SimulationParameters::default();
/// let evaluator = QueryEvaluator::new(&params);
///
/// // a sure return of 3x never loses money
/// let result = evaluator.evaluate(&ParticleDistribution::point(3.0, 16)).unwrap();
/// assert_eq!(result.probability_of_loss().unwrap(), 0.0);
/// assert_eq!(result.portfolio_return(), 3.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct QueryEvaluator {
    low_quantile_probability: f64,
    high_quantile_probability: f64,
}

impl QueryEvaluator {
    /// Creates an evaluator for the quantile probabilities in `params`.
    pub fn new(params: &SimulationParameters) -> Self {
        Self {
            low_quantile_probability: params.low_quantile_probability(),
            high_quantile_probability: params.high_quantile_probability(),
        }
    }

    /// Evaluates all queries on `value` without modifying it.
    ///
    /// A loss is a total return not exceeding the invested capital, so
    /// `probability_of_loss = 1 - P(return > 1)`.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Provider` if a quantile cannot be computed.
    pub fn evaluate<V: DistributionalQuery>(&self, value: &V) -> Result<SimulationResult> {
        let probability_of_loss =
            (1.0 - value.probability_greater_than(TOTAL_INVESTMENT)).clamp(0.0, 1.0);
        let low_quantile = value.quantile(self.low_quantile_probability)?;
        let high_quantile = value.quantile(self.high_quantile_probability)?;
        let portfolio_return = value.mean();

        debug!(
            portfolio_return,
            probability_of_loss, low_quantile, high_quantile, "evaluated portfolio distribution"
        );

        Ok(SimulationResult::distributional(
            portfolio_return,
            probability_of_loss,
            (self.low_quantile_probability, low_quantile),
            (self.high_quantile_probability, high_quantile),
        ))
    }
}
