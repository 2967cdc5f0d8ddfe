//! Error types for the command line interface.

use std::path::PathBuf;

use forecast_core::{ConfigError, ForecastError};
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Parameter validation error
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Engine error
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this tool
    #[error("Failed to parse configuration file {}: {source}", path.display())]
    ConfigParse {
        /// File path
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// Environment override could not be parsed
    #[error("Invalid value '{value}' in environment variable {name}")]
    Environment {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },

    /// Ensemble file could not be written
    #[error("Failed to write ensemble file: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output could not be produced
    #[error("Failed to serialise JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Create an environment override error
    pub fn environment(name: &'static str, value: impl Into<String>) -> Self {
        Self::Environment {
            name,
            value: value.into(),
        }
    }

    /// Returns true for errors caused by the user's input, which are
    /// reported together with the usage line.
    pub fn is_usage(&self) -> bool {
        match self {
            Self::Config(_)
            | Self::ConfigFile { .. }
            | Self::ConfigParse { .. }
            | Self::Environment { .. } => true,
            Self::Forecast(err) => err.is_config(),
            Self::Csv(_) | Self::Json(_) | Self::Io(_) => false,
        }
    }
}
