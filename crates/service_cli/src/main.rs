//! Venture Forecast CLI - portfolio return forecasting from the command line
//!
//! Forecasts the return of a venture-capital portfolio whose investments pay
//! bounded Pareto multiples of their capital.
//!
//! # Modes
//!
//! - default: distributional evaluation with probability of loss and two
//!   quantiles
//! - `-M <iterations>`: Monte Carlo evaluation, mean and variance only; the
//!   draws are written to the ensemble file
//! - `-b`: benchmarking, prints `"<portfolioReturn> <elapsedMicroseconds>"`

use std::path::PathBuf;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use forecast_core::ForecastEngine;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod output;

use config::Settings;
use error::CliError;
use output::OutputFormat;

/// Venture-capital portfolio return forecaster
#[derive(Debug, Parser)]
#[command(name = "venture-forecast")]
#[command(author, version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Pareto shape parameter alpha [default: 1.05]
    #[arg(short = 'a', long = "alpha-pareto", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Lower Pareto bound xMin, the total-loss multiple [default: 0.35]
    #[arg(short = 'x', long = "x-min-pareto", value_name = "X_MIN")]
    pub x_min: Option<f64>,

    /// Upper Pareto bound xMax, the best-case multiple [default: 1000]
    #[arg(short = 'X', long = "x-max-pareto", value_name = "X_MAX")]
    pub x_max: Option<f64>,

    /// Number of investments in the portfolio [default: 100]. Distributional
    /// runs convolve (N - 1) * K^2 atoms and are capped at 2^31
    #[arg(short = 'n', long, value_name = "N")]
    pub number_of_investments: Option<usize>,

    /// Probability of the low quantile [default: 0.01]
    #[arg(short = 'q', long, value_name = "P")]
    pub low_quantile_probability: Option<f64>,

    /// Probability of the high quantile [default: 0.99]
    #[arg(short = 'Q', long, value_name = "P")]
    pub high_quantile_probability: Option<f64>,

    /// Run in Monte Carlo mode with this many iterations
    #[arg(short = 'M', long, value_name = "ITERATIONS")]
    pub monte_carlo_iterations: Option<usize>,

    /// Print timing information
    #[arg(short = 'T', long)]
    pub time: bool,

    /// Benchmarking mode: print only the portfolio return and elapsed microseconds
    #[arg(short = 'b', long)]
    pub benchmarking: bool,

    /// Print results as JSON
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Seed of the Monte Carlo random number generator [default: 0]
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Run Monte Carlo iterations on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Number of particles per distribution [default: 256]
    #[arg(short = 'r', long, value_name = "K")]
    pub representation_size: Option<usize>,

    /// Monte Carlo ensemble file [default: data.out]
    #[arg(short = 'o', long, value_name = "PATH")]
    pub ensemble_output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Report an input error together with the usage line and exit; pass any
/// other error on.
fn input_error(err: CliError) -> anyhow::Error {
    if err.is_usage() {
        Cli::command().error(ErrorKind::ValueValidation, err).exit()
    }
    anyhow::Error::new(err)
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let settings = Settings::resolve(&cli).map_err(input_error)?;
    let params = settings.simulation_parameters().map_err(input_error)?;
    let engine = ForecastEngine::new(params, settings.run_config(cli.benchmarking))
        .map_err(|err| input_error(err.into()))?;

    info!(mode = engine.config().mode().name(), "configuration resolved");

    let outcome = engine.run().context("forecast failed")?;

    let format = OutputFormat::select(cli.json, cli.benchmarking);
    let rendered = output::render(
        &outcome,
        format,
        engine.params().number_of_investments(),
        cli.time,
    )?;
    print!("{}", rendered);

    if let Some(ensemble) = outcome.ensemble() {
        output::write_ensemble(&settings.ensemble_output, ensemble, outcome.elapsed_micros())
            .with_context(|| {
                format!(
                    "could not write ensemble file {}",
                    settings.ensemble_output.display()
                )
            })?;
    }

    Ok(())
}
