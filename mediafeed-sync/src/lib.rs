//! Mediafeed Sync - feed synchronisation engine
//!
//! Keeps a locally held, ordered collection of media items consistent with a
//! remote paginated source across two axes of change: a section filter that
//! replaces the whole collection, and "load more" requests that extend it.
//!
//! - [`PaginationEngine`]: collection, cursor and "more available" flag
//! - [`FilterController`]: active section and the known section set
//! - [`SelectionTracker`]: the single selected item
//! - [`FeedState`]: the orchestrating state machine with epoch-guarded fetches
//! - [`FeedSession`]: async driver binding a [`FeedState`] to a gateway
//! - [`RefreshScheduler`]: cancellable periodic refresh
//!
//! # Example
//!
//! ```ignore
//! let session = FeedSession::new(gateway, SyncConfig::default());
//! session.bootstrap().await;
//! session.start().await;
//!
//! session.set_filter("history").await?;
//! session.load_more().await;
//! let snapshot = session.snapshot().await;
//!
//! session.stop().await;
//! ```

pub mod config;
pub mod filter;
pub mod orchestrator;
pub mod pagination;
pub mod scheduler;
pub mod selection;
pub mod session;

pub use config::{SyncConfig, DEFAULT_PAGE_SIZE, DEFAULT_REFRESH_INTERVAL_SECS};
pub use filter::{FilterChange, FilterController};
pub use orchestrator::{FeedSnapshot, FeedState, FetchKind, FetchOutcome, FetchRequest, ReplaceReason};
pub use pagination::PaginationEngine;
pub use scheduler::{RefreshMetrics, RefreshMetricsSnapshot, RefreshScheduler, RefreshTarget};
pub use selection::SelectionTracker;
pub use session::FeedSession;
