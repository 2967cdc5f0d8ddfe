//! Simulation parameters and Monte Carlo configuration.
//!
//! This module provides the immutable configuration types consumed by the
//! engine. Both are constructed through builders that validate at build
//! time, so a value of either type is always in-domain.

use crate::error::ConfigError;

/// Default Pareto shape parameter.
pub const DEFAULT_ALPHA: f64 = 1.05;

/// Default lower Pareto bound.
pub const DEFAULT_X_MIN: f64 = 0.35;

/// Default upper Pareto bound (before the `x_min` offset).
pub const DEFAULT_X_MAX: f64 = 1000.0;

/// Default portfolio size.
pub const DEFAULT_NUMBER_OF_INVESTMENTS: usize = 100;

/// Default low quantile probability.
pub const DEFAULT_LOW_QUANTILE_PROBABILITY: f64 = 0.01;

/// Default high quantile probability.
pub const DEFAULT_HIGH_QUANTILE_PROBABILITY: f64 = 0.99;

/// Total nominal capital, split evenly across investments.
pub const TOTAL_INVESTMENT: f64 = 1.0;

/// Maximum number of investments in a portfolio.
pub const MAX_INVESTMENTS: usize = 1_000_000;

/// Maximum number of Monte Carlo iterations.
pub const MAX_ITERATIONS: usize = 100_000_000;

/// Default number of particles in the distributional representation.
pub const DEFAULT_REPRESENTATION_SIZE: usize = 256;

/// Maximum number of particles in the distributional representation.
pub const MAX_REPRESENTATION_SIZE: usize = 4096;

/// Maximum number of atoms a distributional run may convolve and sort,
/// `(N - 1) * K^2`. Each sum sorts `K^2` atoms.
pub const MAX_CONVOLUTION_ATOMS: u64 = 1 << 31;

/// Validated parameters of the portfolio model.
///
/// Immutable once built. Use [`SimulationParameters::builder`] to construct
/// instances; unset fields take the reference defaults.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::SimulationParameters;
///
/// let params = SimulationParameters::builder()
///     .alpha(1.2)
///     .number_of_investments(20)
///     .build()
///     .expect("valid parameters");
///
/// assert_eq!(params.number_of_investments(), 20);
/// assert!((params.per_investment_value() - 0.05).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SimulationParameters {
    alpha: f64,
    x_min: f64,
    x_max: f64,
    number_of_investments: usize,
    low_quantile_probability: f64,
    high_quantile_probability: f64,
}

impl SimulationParameters {
    /// Creates a new parameter builder seeded with the defaults.
    #[inline]
    pub fn builder() -> SimulationParametersBuilder {
        SimulationParametersBuilder::default()
    }

    /// Returns the Pareto shape parameter.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the lower Pareto bound.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Returns the upper payoff multiple of a single investment.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Returns the number of investments.
    #[inline]
    pub fn number_of_investments(&self) -> usize {
        self.number_of_investments
    }

    /// Returns the low quantile probability.
    #[inline]
    pub fn low_quantile_probability(&self) -> f64 {
        self.low_quantile_probability
    }

    /// Returns the high quantile probability.
    #[inline]
    pub fn high_quantile_probability(&self) -> f64 {
        self.high_quantile_probability
    }

    /// Capital allocated to each investment.
    #[inline]
    pub fn per_investment_value(&self) -> f64 {
        TOTAL_INVESTMENT / self.number_of_investments as f64
    }

    /// Upper bound of the native Pareto support, `x_max + x_min`.
    #[inline]
    pub fn pareto_upper_bound(&self) -> f64 {
        self.x_max + self.x_min
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `alpha` is not a positive finite number
    /// - `x_min` or `x_max` is negative or not finite
    /// - `x_max < x_min`
    /// - `number_of_investments` is 0 or greater than [`MAX_INVESTMENTS`]
    /// - a quantile probability lies outside (0, 1)
    /// - the high quantile probability is below the low one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !(self.x_min.is_finite() && self.x_min >= 0.0) {
            return Err(ConfigError::InvalidXMin(self.x_min));
        }
        if !(self.x_max.is_finite() && self.x_max >= 0.0) {
            return Err(ConfigError::InvalidXMax(self.x_max));
        }
        if self.x_max < self.x_min {
            return Err(ConfigError::InvertedBounds {
                x_min: self.x_min,
                x_max: self.x_max,
            });
        }
        if !self.pareto_upper_bound().is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "xMax",
                value: "xMax + xMin overflows".to_string(),
            });
        }
        if self.number_of_investments == 0 || self.number_of_investments > MAX_INVESTMENTS {
            return Err(ConfigError::InvalidInvestmentCount(
                self.number_of_investments,
            ));
        }
        check_probability("low quantile probability", self.low_quantile_probability)?;
        check_probability("high quantile probability", self.high_quantile_probability)?;
        if self.high_quantile_probability < self.low_quantile_probability {
            return Err(ConfigError::InvertedQuantiles {
                low: self.low_quantile_probability,
                high: self.high_quantile_probability,
            });
        }
        Ok(())
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            x_min: DEFAULT_X_MIN,
            x_max: DEFAULT_X_MAX,
            number_of_investments: DEFAULT_NUMBER_OF_INVESTMENTS,
            low_quantile_probability: DEFAULT_LOW_QUANTILE_PROBABILITY,
            high_quantile_probability: DEFAULT_HIGH_QUANTILE_PROBABILITY,
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons.
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidQuantileProbability { name, value })
    }
}

/// Builder for [`SimulationParameters`].
///
/// Fields that are not set keep their default value.
#[derive(Clone, Debug, Default)]
pub struct SimulationParametersBuilder {
    alpha: Option<f64>,
    x_min: Option<f64>,
    x_max: Option<f64>,
    number_of_investments: Option<usize>,
    low_quantile_probability: Option<f64>,
    high_quantile_probability: Option<f64>,
}

impl SimulationParametersBuilder {
    /// Sets the Pareto shape parameter, in (0, inf).
    #[inline]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Sets the lower Pareto bound, in [0, x_max].
    #[inline]
    pub fn x_min(mut self, x_min: f64) -> Self {
        self.x_min = Some(x_min);
        self
    }

    /// Sets the upper payoff multiple, in [x_min, inf).
    #[inline]
    pub fn x_max(mut self, x_max: f64) -> Self {
        self.x_max = Some(x_max);
        self
    }

    /// Sets the number of investments, in [1, 1_000_000].
    #[inline]
    pub fn number_of_investments(mut self, number_of_investments: usize) -> Self {
        self.number_of_investments = Some(number_of_investments);
        self
    }

    /// Sets the low quantile probability, in (0, 1).
    #[inline]
    pub fn low_quantile_probability(mut self, probability: f64) -> Self {
        self.low_quantile_probability = Some(probability);
        self
    }

    /// Sets the high quantile probability, in (0, 1).
    #[inline]
    pub fn high_quantile_probability(mut self, probability: f64) -> Self {
        self.high_quantile_probability = Some(probability);
        self
    }

    /// Builds and validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any parameter is out of domain; see
    /// [`SimulationParameters::validate`].
    pub fn build(self) -> Result<SimulationParameters, ConfigError> {
        let params = SimulationParameters {
            alpha: self.alpha.unwrap_or(DEFAULT_ALPHA),
            x_min: self.x_min.unwrap_or(DEFAULT_X_MIN),
            x_max: self.x_max.unwrap_or(DEFAULT_X_MAX),
            number_of_investments: self
                .number_of_investments
                .unwrap_or(DEFAULT_NUMBER_OF_INVESTMENTS),
            low_quantile_probability: self
                .low_quantile_probability
                .unwrap_or(DEFAULT_LOW_QUANTILE_PROBABILITY),
            high_quantile_probability: self
                .high_quantile_probability
                .unwrap_or(DEFAULT_HIGH_QUANTILE_PROBABILITY),
        };

        params.validate()?;
        Ok(params)
    }
}

/// Scheduling of Monte Carlo iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Execution {
    /// Iterations run one after another on the calling thread.
    Sequential,

    /// Iterations are spread over the rayon thread pool.
    #[default]
    Parallel,
}

/// Monte Carlo driver configuration.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::{Execution, MonteCarloConfig};
///
/// let config = MonteCarloConfig::builder()
///     .iterations(10_000)
///     .seed(42)
///     .execution(Execution::Sequential)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.iterations(), 10_000);
/// assert_eq!(config.seed(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonteCarloConfig {
    iterations: usize,
    seed: u64,
    execution: Execution,
}

impl MonteCarloConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> MonteCarloConfigBuilder {
        MonteCarloConfigBuilder::default()
    }

    /// Returns the number of iterations.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the master seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the iteration scheduling.
    #[inline]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidIterationCount` if `iterations` is 0 or
    /// greater than [`MAX_ITERATIONS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::InvalidIterationCount(self.iterations));
        }
        Ok(())
    }
}

/// Builder for [`MonteCarloConfig`].
#[derive(Clone, Debug, Default)]
pub struct MonteCarloConfigBuilder {
    iterations: Option<usize>,
    seed: u64,
    execution: Execution,
}

impl MonteCarloConfigBuilder {
    /// Sets the number of iterations, in [1, 100_000_000].
    #[inline]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Sets the master seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the iteration scheduling.
    #[inline]
    pub fn execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `iterations` is not set or out of range.
    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let iterations = self.iterations.ok_or(ConfigError::InvalidParameter {
            name: "iterations",
            value: "must be specified".to_string(),
        })?;

        let config = MonteCarloConfig {
            iterations,
            seed: self.seed,
            execution: self.execution,
        };

        config.validate()?;
        Ok(config)
    }
}
