//! Fetch gateway contract.
//!
//! The gateway is the only suspension point of the synchronisation core.
//! Transport, authentication and timeouts are entirely its concern; the core
//! only reacts to the eventual success or failure of each call.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Cursor, FeedResult, HasMorePolicy, Page, Section, SectionCatalog, SummaryStats};

/// Async source of paginated items.
///
/// Implementations must be `Send + Sync` so a session can be shared across
/// tasks (refresh scheduler, view layer).
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Fetch one page for `section`, resuming at `cursor` (`None` = start).
    async fn fetch_page(
        &self,
        section: &Section,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> FeedResult<Page>;

    /// Fetch the list of valid sections, if the source publishes one.
    ///
    /// Returns `Ok(None)` when there is no catalog endpoint, in which case
    /// sections are derived from the first loaded page.
    async fn fetch_section_catalog(&self) -> FeedResult<Option<SectionCatalog>> {
        Ok(None)
    }

    /// Fetch decorative summary stats, if available.
    async fn fetch_summary_stats(&self) -> FeedResult<Option<SummaryStats>> {
        Ok(None)
    }

    /// Single source of truth for "more available" on this gateway.
    fn has_more_policy(&self) -> HasMorePolicy {
        HasMorePolicy::ServerFlag
    }
}

#[async_trait]
impl<G: FetchGateway + ?Sized> FetchGateway for Arc<G> {
    async fn fetch_page(
        &self,
        section: &Section,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        (**self).fetch_page(section, cursor, page_size).await
    }

    async fn fetch_section_catalog(&self) -> FeedResult<Option<SectionCatalog>> {
        (**self).fetch_section_catalog().await
    }

    async fn fetch_summary_stats(&self) -> FeedResult<Option<SummaryStats>> {
        (**self).fetch_summary_stats().await
    }

    fn has_more_policy(&self) -> HasMorePolicy {
        (**self).has_more_policy()
    }
}
