//! Run settings assembled from defaults, a TOML file, the environment and
//! the command line.
//!
//! Later sources win: defaults < file < environment < command line.
//!
//! ```toml
//! [simulation]
//! alpha = 1.05
//! x_min = 0.35
//! x_max = 1000.0
//! number_of_investments = 100
//! low_quantile_probability = 0.01
//! high_quantile_probability = 0.99
//! representation_size = 256
//!
//! [monte_carlo]
//! iterations = 100000
//! seed = 42
//! sequential = false
//! ensemble_output = "data.out"
//! ```

use std::path::{Path, PathBuf};

use forecast_core::config::{
    DEFAULT_ALPHA, DEFAULT_HIGH_QUANTILE_PROBABILITY, DEFAULT_LOW_QUANTILE_PROBABILITY,
    DEFAULT_NUMBER_OF_INVESTMENTS, DEFAULT_REPRESENTATION_SIZE, DEFAULT_X_MAX, DEFAULT_X_MIN,
};
use forecast_core::{Execution, RunConfig, RunMode, SimulationParameters};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, Result};
use crate::Cli;

/// Environment variable overriding the master seed.
pub const SEED_ENV: &str = "VENTURE_FORECAST_SEED";

/// Environment variable overriding the particle count.
pub const REPRESENTATION_SIZE_ENV: &str = "VENTURE_FORECAST_REPRESENTATION_SIZE";

/// Default path of the Monte Carlo ensemble file.
pub const DEFAULT_ENSEMBLE_OUTPUT: &str = "data.out";

/// `[simulation]` table of the configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    pub alpha: Option<f64>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub number_of_investments: Option<usize>,
    pub low_quantile_probability: Option<f64>,
    pub high_quantile_probability: Option<f64>,
    pub representation_size: Option<usize>,
}

/// `[monte_carlo]` table of the configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonteCarloSection {
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub sequential: Option<bool>,
    pub ensemble_output: Option<PathBuf>,
}

/// Configuration file contents
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub simulation: SimulationSection,
    pub monte_carlo: MonteCarloSection,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved settings of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub alpha: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub number_of_investments: usize,
    pub low_quantile_probability: f64,
    pub high_quantile_probability: f64,
    pub representation_size: usize,
    pub monte_carlo_iterations: Option<usize>,
    pub seed: u64,
    pub sequential: bool,
    pub ensemble_output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            x_min: DEFAULT_X_MIN,
            x_max: DEFAULT_X_MAX,
            number_of_investments: DEFAULT_NUMBER_OF_INVESTMENTS,
            low_quantile_probability: DEFAULT_LOW_QUANTILE_PROBABILITY,
            high_quantile_probability: DEFAULT_HIGH_QUANTILE_PROBABILITY,
            representation_size: DEFAULT_REPRESENTATION_SIZE,
            monte_carlo_iterations: None,
            seed: 0,
            sequential: false,
            ensemble_output: PathBuf::from(DEFAULT_ENSEMBLE_OUTPUT),
        }
    }
}

impl Settings {
    /// Resolve settings for a parsed command line, reading the optional
    /// configuration file and the process environment.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(path) = &cli.config {
            debug!(path = %path.display(), "loading configuration file");
            settings.apply_file(FileConfig::load(path)?);
        }
        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Apply values present in the configuration file
    pub fn apply_file(&mut self, file: FileConfig) {
        let FileConfig {
            simulation,
            monte_carlo,
        } = file;

        override_with(&mut self.alpha, simulation.alpha);
        override_with(&mut self.x_min, simulation.x_min);
        override_with(&mut self.x_max, simulation.x_max);
        override_with(&mut self.number_of_investments, simulation.number_of_investments);
        override_with(
            &mut self.low_quantile_probability,
            simulation.low_quantile_probability,
        );
        override_with(
            &mut self.high_quantile_probability,
            simulation.high_quantile_probability,
        );
        override_with(&mut self.representation_size, simulation.representation_size);

        if monte_carlo.iterations.is_some() {
            self.monte_carlo_iterations = monte_carlo.iterations;
        }
        override_with(&mut self.seed, monte_carlo.seed);
        override_with(&mut self.sequential, monte_carlo.sequential);
        override_with(&mut self.ensemble_output, monte_carlo.ensemble_output);
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_ENV) {
            self.seed = value
                .trim()
                .parse()
                .map_err(|_| CliError::environment(SEED_ENV, value.clone()))?;
        }
        if let Some(value) = lookup(REPRESENTATION_SIZE_ENV) {
            self.representation_size = value
                .trim()
                .parse()
                .map_err(|_| CliError::environment(REPRESENTATION_SIZE_ENV, value.clone()))?;
        }
        Ok(())
    }

    /// Apply values given on the command line
    pub fn apply_cli(&mut self, cli: &Cli) {
        override_with(&mut self.alpha, cli.alpha);
        override_with(&mut self.x_min, cli.x_min);
        override_with(&mut self.x_max, cli.x_max);
        override_with(&mut self.number_of_investments, cli.number_of_investments);
        override_with(&mut self.low_quantile_probability, cli.low_quantile_probability);
        override_with(&mut self.high_quantile_probability, cli.high_quantile_probability);
        override_with(&mut self.representation_size, cli.representation_size);
        if cli.monte_carlo_iterations.is_some() {
            self.monte_carlo_iterations = cli.monte_carlo_iterations;
        }
        override_with(&mut self.seed, cli.seed);
        if cli.sequential {
            self.sequential = true;
        }
        override_with(&mut self.ensemble_output, cli.ensemble_output.clone());
    }

    /// Build validated model parameters
    pub fn simulation_parameters(&self) -> Result<SimulationParameters> {
        SimulationParameters::builder()
            .alpha(self.alpha)
            .x_min(self.x_min)
            .x_max(self.x_max)
            .number_of_investments(self.number_of_investments)
            .low_quantile_probability(self.low_quantile_probability)
            .high_quantile_probability(self.high_quantile_probability)
            .build()
            .map_err(CliError::from)
    }

    /// Build the engine run configuration
    pub fn run_config(&self, benchmarking: bool) -> RunConfig {
        let execution = if self.sequential {
            Execution::Sequential
        } else {
            Execution::Parallel
        };
        RunConfig::new(RunMode::select(self.monte_carlo_iterations, benchmarking))
            .with_seed(self.seed)
            .with_execution(execution)
            .with_representation_size(self.representation_size)
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
