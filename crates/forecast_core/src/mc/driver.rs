//! Monte Carlo driver: repeats the sampled pipeline and reduces the draws.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use super::ensemble::{EnsembleSummary, MonteCarloEnsemble};
use crate::config::{Execution, MonteCarloConfig, SimulationParameters};
use crate::distribution::SamplingProvider;
use crate::error::Result;
use crate::portfolio::{load_investment_returns, portfolio_return};
use crate::result::SimulationResult;
use crate::rng::ForecastRng;

/// Outcome of a Monte Carlo run.
#[derive(Clone, Debug)]
pub struct MonteCarloOutcome {
    /// Mean-only result; distributional fields are absent.
    pub result: SimulationResult,
    /// Draws in iteration order.
    pub ensemble: MonteCarloEnsemble,
    /// Moments of the draws.
    pub summary: EnsembleSummary,
    /// Wall time spent in sampling and reduction.
    pub elapsed: Duration,
}

impl MonteCarloOutcome {
    /// Iterations completed per microsecond of wall time.
    pub fn throughput(&self) -> f64 {
        let micros = self.elapsed.as_secs_f64() * 1e6;
        if micros > 0.0 {
            self.ensemble.len() as f64 / micros
        } else {
            f64::INFINITY
        }
    }
}

/// Monte Carlo driver.
///
/// Iteration `i` draws from its own generator stream derived from
/// `(seed, i)`, sums its investment returns in index order and writes the
/// total to slot `i`. The ensemble is therefore identical for sequential and
/// parallel execution.
///
/// # Examples
///
/// ```rust
/// use forecast_core::config::{MonteCarloConfig, SimulationParameters};
/// use forecast_core::mc::MonteCarloDriver;
///
/// let params = SimulationParameters::builder()
///     .number_of_investments(10)
///     .build()
///     .unwrap();
/// let config = MonteCarloConfig::builder().iterations(200).seed(7).build().unwrap();
///
/// let outcome = MonteCarloDriver::new(params, config).unwrap().run().unwrap();
/// assert_eq!(outcome.ensemble.len(), 200);
/// assert!(outcome.result.low_quantile().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct MonteCarloDriver {
    params: SimulationParameters,
    config: MonteCarloConfig,
}

impl MonteCarloDriver {
    /// Creates a driver after validating both configurations.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Config` if either configuration is invalid.
    pub fn new(params: SimulationParameters, config: MonteCarloConfig) -> Result<Self> {
        params.validate()?;
        config.validate()?;
        Ok(Self { params, config })
    }

    /// Returns the model parameters.
    #[inline]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Returns the driver configuration.
    #[inline]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Runs all iterations and reduces the ensemble.
    ///
    /// # Errors
    ///
    /// - `ForecastError::Allocation` if the ensemble or a per-iteration
    ///   buffer cannot be allocated
    /// - `ForecastError::Provider` from the first failing iteration
    pub fn run(&self) -> Result<MonteCarloOutcome> {
        let iterations = self.config.iterations();
        let seed = self.config.seed();
        let start = Instant::now();

        info!(
            iterations,
            seed,
            execution = ?self.config.execution(),
            investments = self.params.number_of_investments(),
            "starting Monte Carlo run"
        );

        let mut ensemble = MonteCarloEnsemble::with_len(iterations)?;
        let params = &self.params;

        match self.config.execution() {
            Execution::Sequential => {
                let mut provider = SamplingProvider::new(ForecastRng::from_seed(seed));
                let mut buffer = Vec::new();
                for (index, slot) in ensemble.slots_mut().iter_mut().enumerate() {
                    *slot = run_iteration(params, seed, index, &mut provider, &mut buffer)?;
                }
            }
            Execution::Parallel => {
                ensemble.slots_mut().par_iter_mut().enumerate().try_for_each_init(
                    || (SamplingProvider::new(ForecastRng::from_seed(seed)), Vec::new()),
                    |(provider, buffer), (index, slot)| -> Result<()> {
                        *slot = run_iteration(params, seed, index, provider, buffer)?;
                        Ok(())
                    },
                )?;
            }
        }

        let summary = ensemble.summary();
        let elapsed = start.elapsed();
        debug!(
            mean = summary.mean,
            variance = summary.variance,
            elapsed_us = elapsed.as_micros() as u64,
            "reduced Monte Carlo ensemble"
        );

        Ok(MonteCarloOutcome {
            result: SimulationResult::mean_only(
                summary.mean,
                params.low_quantile_probability(),
                params.high_quantile_probability(),
            ),
            ensemble,
            summary,
            elapsed,
        })
    }
}

/// Runs one sampled pass of builder and aggregator.
fn run_iteration(
    params: &SimulationParameters,
    seed: u64,
    index: usize,
    provider: &mut SamplingProvider,
    buffer: &mut Vec<f64>,
) -> Result<f64> {
    provider.reseed(ForecastRng::for_stream(seed, index as u64));
    load_investment_returns(params, provider, buffer)?;
    portfolio_return(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    fn driver(iterations: usize, seed: u64, execution: Execution) -> MonteCarloDriver {
        let params = SimulationParameters::builder()
            .number_of_investments(20)
            .build()
            .unwrap();
        let config = MonteCarloConfig::builder()
            .iterations(iterations)
            .seed(seed)
            .execution(execution)
            .build()
            .unwrap();
        MonteCarloDriver::new(params, config).unwrap()
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let sequential = driver(500, 11, Execution::Sequential).run().unwrap();
        let parallel = driver(500, 11, Execution::Parallel).run().unwrap();
        assert_eq!(sequential.ensemble, parallel.ensemble);
        assert_eq!(sequential.summary, parallel.summary);
    }

    #[test]
    fn test_seed_changes_draws() {
        let a = driver(50, 1, Execution::Sequential).run().unwrap();
        let b = driver(50, 2, Execution::Sequential).run().unwrap();
        assert_ne!(a.ensemble, b.ensemble);
    }

    #[test]
    fn test_draws_stay_in_support() {
        let outcome = driver(1000, 3, Execution::Parallel).run().unwrap();
        for &draw in outcome.ensemble.draws() {
            assert!((0.0..=1000.0 + 1e-9).contains(&draw));
        }
    }

    #[test]
    fn test_result_reports_ensemble_mean() {
        let outcome = driver(300, 5, Execution::Parallel).run().unwrap();
        assert_eq!(outcome.result.portfolio_return(), outcome.summary.mean);
        assert_eq!(outcome.summary.len, 300);
        assert!(outcome.throughput() > 0.0);
    }

    #[test]
    fn test_result_rejects_distributional_queries() {
        let outcome = driver(10, 0, Execution::Sequential).run().unwrap();
        assert!(matches!(
            outcome.result.probability_of_loss(),
            Err(ForecastError::UnsupportedQuery { .. })
        ));
        assert!(matches!(
            outcome.result.high_quantile(),
            Err(ForecastError::UnsupportedQuery { .. })
        ));
    }

    #[test]
    fn test_single_iteration() {
        let outcome = driver(1, 9, Execution::Parallel).run().unwrap();
        assert_eq!(outcome.ensemble.len(), 1);
        assert_eq!(outcome.summary.variance, 0.0);
    }
}
