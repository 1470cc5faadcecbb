//! Mediafeed CLI - headless client for a paginated media feed
//!
//! Loads a TOML configuration, talks to the feed server over HTTP and
//! drives a [`mediafeed_sync::FeedSession`] from line commands on stdin.

pub mod api_client;
pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api_client::RestGateway;
pub use app::{execute, Reply};
pub use commands::{parse_command, Command, CommandError};
pub use config::{ConfigError, FeedConfig, LogConfig};
pub use error::{CliError, CliResult};
