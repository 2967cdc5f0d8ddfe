//! Run mode selection and dispatch.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{
    Execution, MonteCarloConfig, SimulationParameters, DEFAULT_REPRESENTATION_SIZE,
    MAX_CONVOLUTION_ATOMS,
};
use crate::distribution::{DistributionalQuery, ParticleProvider, UncertainValue};
use crate::error::{ConfigError, Result};
use crate::mc::{EnsembleSummary, MonteCarloDriver, MonteCarloEnsemble};
use crate::portfolio::{load_investment_returns, portfolio_return};
use crate::query::QueryEvaluator;
use crate::result::SimulationResult;

/// How a run evaluates the portfolio. Chosen once before computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// One pass over full distributions, with loss and quantile queries.
    Distributional,

    /// Repeated sampled passes reduced to mean and variance.
    MonteCarlo {
        /// Number of sampled passes.
        iterations: usize,
    },

    /// Portfolio return and timing only; no queries.
    Benchmarking {
        /// Sampled passes, or `None` for a single distributional pass.
        monte_carlo_iterations: Option<usize>,
    },
}

impl RunMode {
    /// Selects the mode from the user's switches.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use forecast_core::engine::RunMode;
    ///
    /// assert_eq!(RunMode::select(None, false), RunMode::Distributional);
    /// assert_eq!(
    ///     RunMode::select(Some(1000), false),
    ///     RunMode::MonteCarlo { iterations: 1000 }
    /// );
    /// assert_eq!(
    ///     RunMode::select(None, true),
    ///     RunMode::Benchmarking { monte_carlo_iterations: None }
    /// );
    /// ```
    pub fn select(monte_carlo_iterations: Option<usize>, benchmarking: bool) -> Self {
        match (benchmarking, monte_carlo_iterations) {
            (true, monte_carlo_iterations) => Self::Benchmarking {
                monte_carlo_iterations,
            },
            (false, Some(iterations)) => Self::MonteCarlo { iterations },
            (false, None) => Self::Distributional,
        }
    }

    /// Number of sampled passes, if the mode samples.
    pub fn monte_carlo_iterations(&self) -> Option<usize> {
        match *self {
            Self::Distributional => None,
            Self::MonteCarlo { iterations } => Some(iterations),
            Self::Benchmarking {
                monte_carlo_iterations,
            } => monte_carlo_iterations,
        }
    }

    /// Returns `true` if loss and quantile queries are evaluated.
    pub fn runs_queries(&self) -> bool {
        matches!(self, Self::Distributional)
    }

    /// Returns `true` for benchmarking mode.
    pub fn is_benchmarking(&self) -> bool {
        matches!(self, Self::Benchmarking { .. })
    }

    /// Human readable mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distributional => "distributional",
            Self::MonteCarlo { .. } => "Monte Carlo",
            Self::Benchmarking { .. } => "benchmarking",
        }
    }
}

/// Run-wide settings next to the model parameters.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::Execution;
/// use forecast_core::engine::{RunConfig, RunMode};
///
/// let config = RunConfig::new(RunMode::MonteCarlo { iterations: 100 })
///     .with_seed(3)
///     .with_execution(Execution::Sequential);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    mode: RunMode,
    seed: u64,
    execution: Execution,
    representation_size: usize,
}

impl RunConfig {
    /// Creates a configuration with default seed, parallel execution and
    /// the default representation size.
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            seed: 0,
            execution: Execution::default(),
            representation_size: DEFAULT_REPRESENTATION_SIZE,
        }
    }

    /// Sets the master seed of sampled runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the scheduling of sampled iterations.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Sets the number of particles per distribution.
    pub fn with_representation_size(mut self, representation_size: usize) -> Self {
        self.representation_size = representation_size;
        self
    }

    /// Returns the run mode.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Returns the master seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the iteration scheduling.
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Returns the number of particles per distribution.
    pub fn representation_size(&self) -> usize {
        self.representation_size
    }

    /// Validates the iteration count and representation size.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Config` on an out-of-range value.
    pub fn validate(&self) -> Result<()> {
        ParticleProvider::new(self.representation_size)?;
        if self.mode.monte_carlo_iterations().is_some() {
            self.monte_carlo_config()?;
        }
        Ok(())
    }

    /// Checks that a distributional pass over `params` stays within
    /// [`MAX_CONVOLUTION_ATOMS`]. Sampled modes always pass.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Config` with `ConfigError::ConvolutionBudget`.
    pub fn validate_workload(&self, params: &SimulationParameters) -> Result<()> {
        if self.mode.monte_carlo_iterations().is_some() {
            return Ok(());
        }
        let investments = params.number_of_investments();
        let size = self.representation_size as u64;
        let atoms = (investments.saturating_sub(1) as u64).saturating_mul(size * size);
        if atoms > MAX_CONVOLUTION_ATOMS {
            return Err(ConfigError::ConvolutionBudget {
                investments,
                representation_size: self.representation_size,
                atoms,
                limit: MAX_CONVOLUTION_ATOMS,
            }
            .into());
        }
        Ok(())
    }

    fn monte_carlo_config(&self) -> Result<Option<MonteCarloConfig>> {
        self.mode
            .monte_carlo_iterations()
            .map(|iterations| {
                MonteCarloConfig::builder()
                    .iterations(iterations)
                    .seed(self.seed)
                    .execution(self.execution)
                    .build()
            })
            .transpose()
            .map_err(Into::into)
    }
}

/// Everything a run produced.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    mode: RunMode,
    result: SimulationResult,
    ensemble: Option<MonteCarloEnsemble>,
    summary: Option<EnsembleSummary>,
    elapsed: Duration,
}

impl RunOutcome {
    /// Mode the run was executed in.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Statistics of the run.
    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    /// Draws of a sampled run.
    pub fn ensemble(&self) -> Option<&MonteCarloEnsemble> {
        self.ensemble.as_ref()
    }

    /// Sample variance of a sampled run.
    pub fn variance(&self) -> Option<f64> {
        self.summary.map(|s| s.variance)
    }

    /// Ensemble moments of a sampled run.
    pub fn summary(&self) -> Option<&EnsembleSummary> {
        self.summary.as_ref()
    }

    /// Wall time of the whole computation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Wall time in whole microseconds.
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX)
    }

    /// Sampled iterations per microsecond, for sampled runs.
    pub fn throughput(&self) -> Option<f64> {
        let iterations = self.ensemble.as_ref()?.len() as f64;
        let micros = self.elapsed.as_secs_f64() * 1e6;
        Some(if micros > 0.0 {
            iterations / micros
        } else {
            f64::INFINITY
        })
    }
}

/// Forecasting engine dispatching on the run mode.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::SimulationParameters;
/// use forecast_core::engine::{ForecastEngine, RunConfig, RunMode};
///
/// let params = SimulationParameters::builder()
///     .number_of_investments(10)
///     .build()
///     .unwrap();
/// let config = RunConfig::new(RunMode::Distributional).with_representation_size(64);
///
/// let outcome = ForecastEngine::new(params, config).unwrap().run().unwrap();
/// let loss = outcome.result().probability_of_loss().unwrap();
/// assert!((0.0..=1.0).contains(&loss));
/// ```
#[derive(Clone, Debug)]
pub struct ForecastEngine {
    params: SimulationParameters,
    config: RunConfig,
}

impl ForecastEngine {
    /// Creates an engine after validating all settings.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Config` if any setting is invalid or a
    /// distributional pass would exceed the convolution budget.
    pub fn new(params: SimulationParameters, config: RunConfig) -> Result<Self> {
        params.validate()?;
        config.validate()?;
        config.validate_workload(&params)?;
        Ok(Self { params, config })
    }

    /// Returns the model parameters.
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Returns the run settings.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of any pass.
    pub fn run(&self) -> Result<RunOutcome> {
        let mode = self.config.mode;
        info!(
            mode = mode.name(),
            investments = self.params.number_of_investments(),
            "starting forecast"
        );
        let start = Instant::now();

        let (result, ensemble, summary) = match self.config.monte_carlo_config()? {
            Some(mc_config) => {
                let outcome = MonteCarloDriver::new(self.params.clone(), mc_config)?.run()?;
                (outcome.result, Some(outcome.ensemble), Some(outcome.summary))
            }
            None => (self.run_distributional(mode.runs_queries())?, None, None),
        };

        let result = if mode.is_benchmarking() {
            result.with_mode(mode.name())
        } else {
            result
        };
        let elapsed = start.elapsed();
        debug!(elapsed_us = elapsed.as_micros() as u64, "forecast finished");

        Ok(RunOutcome {
            mode,
            result,
            ensemble,
            summary,
            elapsed,
        })
    }

    fn run_distributional(&self, with_queries: bool) -> Result<SimulationResult> {
        let mut provider = ParticleProvider::new(self.config.representation_size)?;
        let mut returns = Vec::new();
        load_investment_returns(&self.params, &mut provider, &mut returns)?;
        let total = portfolio_return(&returns)?;

        let (lower, upper) = total.support();
        debug!(
            particles = total.len(),
            lower, upper, "aggregated portfolio distribution"
        );

        if with_queries {
            QueryEvaluator::new(&self.params).evaluate(&total)
        } else {
            Ok(SimulationResult::mean_only(
                total.mean(),
                self.params.low_quantile_probability(),
                self.params.high_quantile_probability(),
            ))
        }
    }
}
