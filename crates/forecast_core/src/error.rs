//! Error types for the forecasting engine.
//!
//! This module defines structured error types for parameter validation,
//! distribution provider failures and unsupported queries.
//!
//! - [`ConfigError`]: Out-of-domain or missing parameters, raised before any
//!   computation starts
//! - [`ProviderError`]: The distribution provider cannot satisfy a request
//! - [`ForecastError`]: Umbrella error returned by the engine

use thiserror::Error;

/// Convenience result alias for engine operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Configuration error for simulation parameters.
///
/// These errors occur during construction when invalid parameters are
/// provided. A configuration is never partially applied.
///
/// # Examples
///
/// ```
/// use forecast_core::error::ConfigError;
///
/// let err = ConfigError::InvalidInvestmentCount(0);
/// assert!(err.to_string().contains("number of investments"));
/// ```
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Pareto shape parameter is not a positive finite number.
    #[error("Invalid alpha {0}: the Pareto shape parameter must be a positive real number")]
    InvalidAlpha(f64),

    /// Lower Pareto bound is negative or not finite.
    #[error("Invalid xMin {0}: the Pareto xMin parameter must be a non-negative real number")]
    InvalidXMin(f64),

    /// Upper Pareto bound is negative or not finite.
    #[error("Invalid xMax {0}: the Pareto xMax parameter must be a non-negative real number")]
    InvalidXMax(f64),

    /// Upper Pareto bound is below the lower bound.
    #[error("Invalid bounds: xMax ({x_max}) cannot be smaller than xMin ({x_min})")]
    InvertedBounds {
        /// Lower bound.
        x_min: f64,
        /// Upper bound.
        x_max: f64,
    },

    /// Investment count outside [1, MAX_INVESTMENTS].
    #[error("Invalid number of investments {0}: must be in range [1, 1_000_000]")]
    InvalidInvestmentCount(usize),

    /// Quantile probability outside the open interval (0, 1).
    #[error("Invalid {name} {value}: must be a value in (0, 1)")]
    InvalidQuantileProbability {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// High quantile probability below the low quantile probability.
    #[error("Invalid quantile probabilities: high ({high}) cannot be smaller than low ({low})")]
    InvertedQuantiles {
        /// Low quantile probability.
        low: f64,
        /// High quantile probability.
        high: f64,
    },

    /// Monte Carlo iteration count outside [1, MAX_ITERATIONS].
    #[error("Invalid Monte Carlo iteration count {0}: must be in range [1, 100_000_000]")]
    InvalidIterationCount(usize),

    /// Particle representation size outside [1, MAX_REPRESENTATION_SIZE].
    #[error("Invalid representation size {0}: must be in range [1, 4096]")]
    InvalidRepresentationSize(usize),

    /// Distributional run whose convolutions exceed
    /// [`MAX_CONVOLUTION_ATOMS`](crate::config::MAX_CONVOLUTION_ATOMS).
    #[error(
        "Distributional run with {investments} investments and representation size \
         {representation_size} needs {atoms} convolution atoms (limit {limit}): \
         reduce either, or use Monte Carlo mode"
    )]
    ConvolutionBudget {
        /// Number of investments.
        investments: usize,
        /// Particles per distribution.
        representation_size: usize,
        /// Atoms the run would sort, `(investments - 1) * size^2`.
        atoms: u64,
        /// Upper limit on `atoms`.
        limit: u64,
    },

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

/// Failure of the distribution provider.
///
/// Provider errors are fatal for the current run: they propagate
/// immediately and are never retried.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProviderError {
    /// Shape parameter rejected by the provider.
    #[error("Invalid bounded Pareto shape {0}: must be a positive finite number")]
    InvalidShape(f64),

    /// Support bounds rejected by the provider.
    #[error("Invalid bounded Pareto support [{lower}, {upper}]: requires 0 <= lower <= upper < inf")]
    InvalidSupport {
        /// Lower bound of the support.
        lower: f64,
        /// Upper bound of the support.
        upper: f64,
    },

    /// Quantile requested outside (0, 1).
    #[error("Invalid quantile probability {0}: must be in (0, 1)")]
    InvalidProbability(f64),

    /// A computation produced NaN or infinity.
    #[error("Non-finite result while computing {0}")]
    NonFinite(&'static str),

    /// Shape so close to zero that the truncated mass `1 - (L/H)^a`
    /// underflows and the distribution cannot be normalised.
    #[error("Bounded Pareto shape {alpha} is too small for support [{lower}, {upper}]: the truncated mass underflows")]
    MassUnderflow {
        /// Shape parameter.
        alpha: f64,
        /// Lower bound of the support.
        lower: f64,
        /// Upper bound of the support.
        upper: f64,
    },
}

/// Errors returned by the forecasting engine.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Parameter validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Distribution provider failed.
    #[error("Distribution provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A distributional query was requested from a mode that cannot answer it.
    #[error("Unsupported query: {query} is not available in {mode} mode")]
    UnsupportedQuery {
        /// Name of the requested query.
        query: &'static str,
        /// Name of the evaluation mode.
        mode: &'static str,
    },

    /// A run buffer could not be allocated.
    #[error("Allocation failure: could not reserve {count} entries for {what}")]
    Allocation {
        /// Buffer description.
        what: &'static str,
        /// Requested entry count.
        count: usize,
    },

    /// Aggregation was asked to sum zero investment returns.
    #[error("Cannot aggregate an empty portfolio")]
    EmptyPortfolio,
}

impl ForecastError {
    /// Create an unsupported query error for sampled (Monte Carlo) mode.
    pub fn unsupported_in_sampled_mode(query: &'static str) -> Self {
        Self::UnsupportedQuery {
            query,
            mode: "Monte Carlo",
        }
    }

    /// Create an unsupported query error for benchmarking mode.
    pub fn unsupported_in_benchmarking_mode(query: &'static str) -> Self {
        Self::UnsupportedQuery {
            query,
            mode: "benchmarking",
        }
    }

    /// Create an allocation error.
    pub fn allocation(what: &'static str, count: usize) -> Self {
        Self::Allocation { what, count }
    }

    /// Returns true for errors raised by parameter validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
