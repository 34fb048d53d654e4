//! CLI error types.

use location_core::ReconciliationError;
use location_shared_types::LocationError;
use thiserror::Error;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error("Settings parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
