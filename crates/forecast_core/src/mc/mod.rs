//! # Monte Carlo Evaluation
//!
//! Sampled evaluation of the portfolio model. Every iteration draws one
//! concrete return per investment, sums them, and stores the total in its
//! own slot of a pre-sized [`MonteCarloEnsemble`]. The ensemble is then
//! reduced to mean and sample variance.
//!
//! ```text
//! MonteCarloDriver
//! ├── MonteCarloConfig     (iterations, seed, execution)
//! ├── SamplingProvider     (one stream per iteration)
//! ├── MonteCarloEnsemble   (slot i <- iteration i)
//! └── RunningMoments       (Welford reduction)
//! ```
//!
//! Only the two moments survive the reduction. Probability and quantile
//! queries on the ensemble, its summary or the run result fail with
//! [`ForecastError::UnsupportedQuery`](crate::error::ForecastError).

mod driver;
mod ensemble;

pub use driver::{MonteCarloDriver, MonteCarloOutcome};
pub use ensemble::{EnsembleSummary, MonteCarloEnsemble, RunningMoments};
