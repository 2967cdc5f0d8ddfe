//! # Forecast Core
//!
//! Return forecasting for a venture-capital portfolio of independent
//! investments, each modelled as a bounded Pareto multiple of its capital.
//!
//! ## Evaluation modes
//!
//! - **Distributional**: every investment return is a full distribution
//!   (a weighted particle set with exact support). The portfolio return is
//!   their independent sum, queried once for the probability of loss and two
//!   quantiles.
//! - **Monte Carlo**: every investment return is one concrete draw. The
//!   pipeline repeats `M` times and the draws are reduced to mean and
//!   variance. Tail queries are not available in this mode.
//! - **Benchmarking**: either of the above, reporting only the portfolio
//!   return and the elapsed time.
//!
//! ## Pipeline
//!
//! ```text
//! SimulationParameters
//!   └─ load_investment_returns   N x bounded Pareto on [xMin, xMax + xMin],
//!        │                       shifted by -xMin, scaled by 1/N
//!        └─ portfolio_return     independent sum, support [0, xMax]
//!             ├─ QueryEvaluator        (distributional)
//!             └─ MonteCarloEnsemble    (sampled, one slot per iteration)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use forecast_core::config::SimulationParameters;
//! use forecast_core::engine::{ForecastEngine, RunConfig, RunMode};
//!
//! let params = SimulationParameters::builder()
//!     .number_of_investments(20)
//!     .build()
//!     .unwrap();
//!
//! let engine = ForecastEngine::new(params, RunConfig::new(RunMode::Distributional)).unwrap();
//! let outcome = engine.run().unwrap();
//! let result = outcome.result();
//!
//! assert!(result.low_quantile().unwrap() <= result.high_quantile().unwrap());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize` for [`config::SimulationParameters`],
//!   [`result::SimulationResult`] and [`mc::EnsembleSummary`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod mc;
pub mod portfolio;
pub mod query;
pub mod result;
pub mod rng;

// Re-export commonly used items for convenience
pub use config::{Execution, MonteCarloConfig, SimulationParameters};
pub use engine::{ForecastEngine, RunConfig, RunMode, RunOutcome};
pub use error::{ConfigError, ForecastError, ProviderError};
pub use result::SimulationResult;
