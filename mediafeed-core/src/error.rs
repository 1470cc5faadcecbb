//! Error types for feed operations

use crate::{Section, Timestamp};
use chrono::Utc;
use thiserror::Error;

/// Errors raised by the fetch gateway or by synchronous feed operations.
///
/// Stale results are not errors; they are discarded by the orchestrator
/// and never reach this type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },

    #[error("Unknown section: {section}")]
    InvalidFilter { section: Section },
}

impl FeedError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// User-visible record of a failed fetch, as exposed in snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub at: Timestamp,
}

impl From<&FeedError> for FetchFailure {
    fn from(err: &FeedError) -> Self {
        Self {
            message: err.to_string(),
            at: Utc::now(),
        }
    }
}
