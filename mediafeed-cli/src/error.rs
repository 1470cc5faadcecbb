//! Error types for the CLI.

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use mediafeed_core::FeedError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] FeedError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

pub type CliResult<T> = Result<T, CliError>;
