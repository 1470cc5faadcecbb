//! Library-level configuration for a feed session.

use mediafeed_core::Section;
use std::time::Duration;

/// Items requested per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Period of the refresh scheduler when nothing else is configured.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Configuration for a [`FeedSession`](crate::FeedSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Items requested per fetch.
    pub page_size: usize,
    /// Period of the refresh scheduler.
    pub refresh_interval: Duration,
    /// Section active before the user picks one.
    pub initial_section: Section,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            initial_section: Section::all(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_initial_section(mut self, section: impl Into<Section>) -> Self {
        self.initial_section = section.into();
        self
    }
}
