//! Outcome of one forecasting run.

use crate::error::{ForecastError, Result};

/// Statistics produced by a run.
///
/// The portfolio return is always present. The distributional statistics are
/// only present when the run evaluated a full distribution; asking for them
/// otherwise yields [`ForecastError::UnsupportedQuery`].
///
/// # Examples
///
/// ```rust
/// use forecast_core::result::SimulationResult;
///
/// let result = SimulationResult::mean_only(1.8, 0.01, 0.99);
/// assert_eq!(result.portfolio_return(), 1.8);
/// assert!(result.probability_of_loss().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SimulationResult {
    portfolio_return: f64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    probability_of_loss: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    low_quantile: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    high_quantile: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    low_quantile_probability: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    high_quantile_probability: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    mode: &'static str,
}

impl SimulationResult {
    /// Result of a distributional evaluation.
    pub fn distributional(
        portfolio_return: f64,
        probability_of_loss: f64,
        (low_quantile_probability, low_quantile): (f64, f64),
        (high_quantile_probability, high_quantile): (f64, f64),
    ) -> Self {
        Self {
            portfolio_return,
            probability_of_loss: Some(probability_of_loss),
            low_quantile: Some(low_quantile),
            high_quantile: Some(high_quantile),
            low_quantile_probability,
            high_quantile_probability,
            mode: "distributional",
        }
    }

    /// Result carrying only the expected portfolio return.
    pub fn mean_only(
        portfolio_return: f64,
        low_quantile_probability: f64,
        high_quantile_probability: f64,
    ) -> Self {
        Self {
            portfolio_return,
            probability_of_loss: None,
            low_quantile: None,
            high_quantile: None,
            low_quantile_probability,
            high_quantile_probability,
            mode: "Monte Carlo",
        }
    }

    pub(crate) fn with_mode(mut self, mode: &'static str) -> Self {
        self.mode = mode;
        self
    }

    /// Expected return of the whole portfolio.
    #[inline]
    pub fn portfolio_return(&self) -> f64 {
        self.portfolio_return
    }

    /// Probability that the portfolio returns at most the invested capital.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::UnsupportedQuery` if it was not computed.
    pub fn probability_of_loss(&self) -> Result<f64> {
        self.probability_of_loss
            .ok_or_else(|| self.unsupported("probability of loss"))
    }

    /// Quantile at the low quantile probability.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::UnsupportedQuery` if it was not computed.
    pub fn low_quantile(&self) -> Result<f64> {
        self.low_quantile.ok_or_else(|| self.unsupported("quantile"))
    }

    /// Quantile at the high quantile probability.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::UnsupportedQuery` if it was not computed.
    pub fn high_quantile(&self) -> Result<f64> {
        self.high_quantile.ok_or_else(|| self.unsupported("quantile"))
    }

    /// Probability at which [`low_quantile`](Self::low_quantile) is taken.
    #[inline]
    pub fn low_quantile_probability(&self) -> f64 {
        self.low_quantile_probability
    }

    /// Probability at which [`high_quantile`](Self::high_quantile) is taken.
    #[inline]
    pub fn high_quantile_probability(&self) -> f64 {
        self.high_quantile_probability
    }

    /// Returns `true` if the distributional statistics are available.
    #[inline]
    pub fn has_distribution(&self) -> bool {
        self.probability_of_loss.is_some()
    }

    fn unsupported(&self, query: &'static str) -> ForecastError {
        ForecastError::UnsupportedQuery {
            query,
            mode: self.mode,
        }
    }
}
