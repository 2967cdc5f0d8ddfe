//! Result rendering and the Monte Carlo ensemble file.

use std::path::Path;

use forecast_core::mc::MonteCarloEnsemble;
use forecast_core::{RunOutcome, SimulationResult};
use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable sentences
    Text,
    /// Single JSON object
    Json,
    /// `"<portfolioReturn> <elapsedMicroseconds>"`
    Benchmark,
}

impl OutputFormat {
    /// Pick the format from the command line switches. Benchmarking wins.
    pub fn select(json: bool, benchmarking: bool) -> Self {
        if benchmarking {
            Self::Benchmark
        } else if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    result: &'a SimulationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    variance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_seconds: Option<f64>,
}

/// Render the outcome of a run.
pub fn render(
    outcome: &RunOutcome,
    format: OutputFormat,
    number_of_investments: usize,
    show_time: bool,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome, number_of_investments, show_time)),
        OutputFormat::Json => render_json(outcome, show_time),
        OutputFormat::Benchmark => Ok(render_benchmark(outcome)),
    }
}

fn render_text(outcome: &RunOutcome, number_of_investments: usize, show_time: bool) -> String {
    let result = outcome.result();
    let mut text = format!(
        "The forecast for the total portfolio return with portfolio size {} is {:.6} times the initial total investment.\n",
        number_of_investments,
        result.portfolio_return()
    );

    if let (Ok(loss), Ok(low), Ok(high)) = (
        result.probability_of_loss(),
        result.low_quantile(),
        result.high_quantile(),
    ) {
        text.push_str(&format!(
            "The probability of loss for this portfolio is {:.6}.\n",
            loss
        ));
        for (probability, quantile) in [
            (result.low_quantile_probability(), low),
            (result.high_quantile_probability(), high),
        ] {
            text.push_str(&format!(
                "The {:.6} quantile of the total portfolio return is {:.6}.\n",
                probability, quantile
            ));
        }
    }

    if show_time {
        text.push_str(&format!(
            "Elapsed time: {:.6} seconds\n",
            outcome.elapsed().as_secs_f64()
        ));
        if let Some(throughput) = outcome.throughput() {
            text.push_str(&format!(
                "Throughput: {:.6} iterations per microsecond\n",
                throughput
            ));
        }
    }

    text
}

fn render_json(outcome: &RunOutcome, show_time: bool) -> Result<String> {
    let report = JsonReport {
        result: outcome.result(),
        variance: outcome.variance(),
        elapsed_seconds: show_time.then(|| outcome.elapsed().as_secs_f64()),
    };
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}

fn render_benchmark(outcome: &RunOutcome) -> String {
    format!(
        "{:.6} {}\n",
        outcome.result().portfolio_return(),
        outcome.elapsed_micros()
    )
}

/// Write the ensemble as a headerless one-column CSV file: one draw per
/// record, then one record holding the elapsed microseconds.
pub fn write_ensemble(path: &Path, ensemble: &MonteCarloEnsemble, elapsed_micros: u64) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    for draw in ensemble.draws() {
        writer.serialize(draw)?;
    }
    writer.serialize(elapsed_micros)?;
    writer.flush()?;

    info!(path = %path.display(), draws = ensemble.len(), "wrote Monte Carlo ensemble");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::{ForecastEngine, RunConfig, RunMode, SimulationParameters};

    fn outcome(mode: RunMode) -> RunOutcome {
        let params = SimulationParameters::builder()
            .number_of_investments(5)
            .build()
            .unwrap();
        let config = RunConfig::new(mode).with_representation_size(32).with_seed(1);
        ForecastEngine::new(params, config).unwrap().run().unwrap()
    }

    #[test]
    fn test_select_format() {
        assert_eq!(OutputFormat::select(false, false), OutputFormat::Text);
        assert_eq!(OutputFormat::select(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::select(true, true), OutputFormat::Benchmark);
    }

    #[test]
    fn test_text_distributional() {
        let text = render(&outcome(RunMode::Distributional), OutputFormat::Text, 5, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("The forecast for the total portfolio return with portfolio size 5 is"));
        assert!(lines[1].starts_with("The probability of loss for this portfolio is"));
        assert!(lines[2].starts_with("The 0.010000 quantile"));
        assert!(lines[3].starts_with("The 0.990000 quantile"));
    }

    #[test]
    fn test_text_sentences_are_formatted() {
        let run = outcome(RunMode::Distributional);
        let text = render(&run, OutputFormat::Text, 5, true).unwrap();
        let result = run.result();

        assert!(text.ends_with('\n'));
        assert!(text.starts_with(&format!(
            "The forecast for the total portfolio return with portfolio size 5 is {:.6} times the initial total investment.\n",
            result.portfolio_return()
        )));
        assert!(text.contains(&format!(
            "The 0.990000 quantile of the total portfolio return is {:.6}.\n",
            result.high_quantile().unwrap()
        )));
        // distributional runs report time but no throughput
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().last().unwrap().starts_with("Elapsed time: "));
    }

    #[test]
    fn test_text_monte_carlo_with_time() {
        let text = render(
            &outcome(RunMode::MonteCarlo { iterations: 20 }),
            OutputFormat::Text,
            5,
            true,
        )
        .unwrap();

        assert!(!text.contains("probability of loss"));
        assert!(text.contains("Elapsed time:"));
        assert!(text.contains("iterations per microsecond"));
    }

    #[test]
    fn test_json_distributional() {
        let json = render(&outcome(RunMode::Distributional), OutputFormat::Json, 5, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["portfolioReturn"].is_f64());
        assert!(value["probabilityOfLoss"].is_f64());
        assert!(value["lowQuantile"].is_f64());
        assert!(value["highQuantile"].is_f64());
        assert!(value.get("variance").is_none());
        assert!(value.get("elapsedSeconds").is_none());
    }

    #[test]
    fn test_json_monte_carlo() {
        let json = render(
            &outcome(RunMode::MonteCarlo { iterations: 20 }),
            OutputFormat::Json,
            5,
            true,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["portfolioReturn"].is_f64());
        assert!(value["variance"].is_f64());
        assert!(value["elapsedSeconds"].is_f64());
        assert!(value.get("probabilityOfLoss").is_none());
        assert!(value.get("lowQuantile").is_none());
    }

    #[test]
    fn test_benchmark_line() {
        let run = outcome(RunMode::Benchmarking {
            monte_carlo_iterations: None,
        });
        let line = render(&run, OutputFormat::Benchmark, 5, false).unwrap();
        let fields: Vec<&str> = line.split_whitespace().collect();

        assert_eq!(fields.len(), 2);
        let value: f64 = fields[0].parse().unwrap();
        approx::assert_relative_eq!(value, run.result().portfolio_return(), epsilon = 1e-6);
        assert_eq!(fields[1].parse::<u64>().unwrap(), run.elapsed_micros());
    }

    #[test]
    fn test_write_ensemble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.out");
        let ensemble = MonteCarloEnsemble::from_draws(vec![1.25, 0.5, 3.0]);

        write_ensemble(&path, &ensemble, 1234).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<&str> = content.lines().collect();
        assert_eq!(records, vec!["1.25", "0.5", "3.0", "1234"]);
    }
}
