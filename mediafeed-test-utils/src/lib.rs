//! Mediafeed Test Utilities
//!
//! Shared test infrastructure for the mediafeed workspace:
//! - Item fixtures with predictable ids and titles
//! - Proptest generators for items, sections and pages
//! - [`InMemoryGateway`]: an offset-paged gateway over a fixed item list
//! - [`ScriptedGateway`]: a gateway whose fetches are answered by the test

pub use mediafeed_core::{
    Cursor, FeedError, FeedResult, FetchGateway, HasMorePolicy, Item, Page, Section,
    SectionCatalog, SummaryStats, Timestamp,
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

// ============================================================================
// FIXTURES
// ============================================================================

fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A single item in `section`, titled `"Item {id}"`.
pub fn item(id: &str, section: &str) -> Item {
    Item {
        id: id.to_string(),
        title: format!("Item {}", id),
        description: String::new(),
        thumbnail_url: format!("https://img.example.com/{}.jpg", id),
        channel_id: format!("channel-{}", section),
        channel_title: format!("Channel {}", section),
        section: Section::new(section),
        published_at: base_time(),
    }
}

/// `n` items with ids `"{prefix}-0"` .. `"{prefix}-{n-1}"`, newest first.
pub fn items(prefix: &str, section: &str, n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let mut item = item(&format!("{}-{}", prefix, i), section);
            item.published_at = base_time() - Duration::minutes(i as i64);
            item
        })
        .collect()
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for feed types.

    use super::*;
    use proptest::prelude::*;

    /// A concrete (non-wildcard) section name.
    pub fn arb_section() -> impl Strategy<Value = Section> {
        prop_oneof![
            Just(Section::new("culture")),
            Just(Section::new("history")),
            Just(Section::new("theory")),
        ]
    }

    /// An item whose id is drawn from a small space so duplicates occur.
    pub fn arb_item() -> impl Strategy<Value = Item> {
        (0u8..32, arb_section())
            .prop_map(|(n, section)| item(&format!("v{}", n), section.as_str()))
    }

    /// A page of up to `max_len` items.
    pub fn arb_page(max_len: usize) -> impl Strategy<Value = Page> {
        (prop::collection::vec(arb_item(), 0..=max_len), any::<bool>()).prop_map(
            |(items, has_more)| {
                let next = has_more.then(|| Cursor::Token(format!("t{}", items.len())));
                Page::new(items, next, has_more)
            },
        )
    }
}

// ============================================================================
// IN-MEMORY GATEWAY
// ============================================================================

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Gateway serving a fixed, newest-first item list with offset cursors.
///
/// Mirrors the REST backend: `has_more` is `offset + limit < total` and the
/// next cursor is the offset just past the returned page.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    items: Vec<Item>,
    catalog: Option<SectionCatalog>,
    policy: HasMorePolicy,
    page_calls: AtomicUsize,
    fail_next: Mutex<Option<FeedError>>,
    last_cursor: Mutex<Option<Option<Cursor>>>,
}

impl InMemoryGateway {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn with_catalog(mut self, sections: Vec<&str>) -> Self {
        self.catalog = Some(SectionCatalog {
            sections: sections.into_iter().map(Section::new).collect(),
        });
        self
    }

    pub fn with_policy(mut self, policy: HasMorePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of `fetch_page` calls so far, failed ones included.
    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Make the next `fetch_page` call fail with `error`.
    pub fn fail_next(&self, error: FeedError) {
        *lock(&self.fail_next) = Some(error);
    }

    /// Cursor passed to the most recent `fetch_page`, if any call was made.
    pub fn last_cursor(&self) -> Option<Option<Cursor>> {
        lock(&self.last_cursor).clone()
    }
}

#[async_trait]
impl FetchGateway for InMemoryGateway {
    async fn fetch_page(
        &self,
        section: &Section,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_cursor) = Some(cursor.cloned());

        if let Some(err) = lock(&self.fail_next).take() {
            return Err(err);
        }

        let offset = match cursor {
            None => 0,
            Some(Cursor::Offset(offset)) => *offset as usize,
            Some(Cursor::Token(token)) => {
                return Err(FeedError::server(400, format!("unsupported cursor {}", token)))
            }
        };

        let matching: Vec<&Item> = self.items.iter().filter(|i| i.belongs_to(section)).collect();
        let page: Vec<Item> = matching
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|i| (*i).clone())
            .collect();
        let has_more = offset + page_size < matching.len();
        let next_cursor = self
            .policy
            .continues(has_more, page.len(), page_size)
            .then(|| Cursor::Offset((offset + page.len()) as u64));

        Ok(Page::new(page, next_cursor, has_more))
    }

    async fn fetch_section_catalog(&self) -> FeedResult<Option<SectionCatalog>> {
        Ok(self.catalog.clone())
    }

    async fn fetch_summary_stats(&self) -> FeedResult<Option<SummaryStats>> {
        let channels: HashSet<&str> = self.items.iter().map(|i| i.channel_id.as_str()).collect();
        Ok(Some(SummaryStats {
            item_count: self.items.len() as u64,
            source_count: channels.len() as u64,
            oldest: self.items.iter().map(|i| i.published_at).min(),
            newest: self.items.iter().map(|i| i.published_at).max(),
            last_update: Some(base_time()),
        }))
    }

    fn has_more_policy(&self) -> HasMorePolicy {
        self.policy
    }
}

// ============================================================================
// SCRIPTED GATEWAY
// ============================================================================

/// Gateway that parks every page fetch until the test answers it.
///
/// Lets a test hold several fetches in flight and resolve them in any order.
/// Catalog and stats are unsupported and return `Ok(None)`.
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    tx: mpsc::UnboundedSender<PendingFetch>,
}

/// Receiving side of a [`ScriptedGateway`].
#[derive(Debug)]
pub struct PendingFetches {
    rx: mpsc::UnboundedReceiver<PendingFetch>,
}

/// One parked page fetch.
#[derive(Debug)]
pub struct PendingFetch {
    pub section: Section,
    pub cursor: Option<Cursor>,
    pub page_size: usize,
    responder: oneshot::Sender<FeedResult<Page>>,
}

impl ScriptedGateway {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (ScriptedGateway, PendingFetches) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ScriptedGateway { tx }, PendingFetches { rx })
    }
}

impl PendingFetches {
    /// Wait for the next fetch the gateway receives.
    pub async fn next(&mut self) -> Option<PendingFetch> {
        self.rx.recv().await
    }

    /// A fetch that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<PendingFetch> {
        self.rx.try_recv().ok()
    }
}

impl PendingFetch {
    pub fn respond(self, result: FeedResult<Page>) {
        let _ = self.responder.send(result);
    }
}

#[async_trait]
impl FetchGateway for ScriptedGateway {
    async fn fetch_page(
        &self,
        section: &Section,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        let (responder, response) = oneshot::channel();
        let pending = PendingFetch {
            section: section.clone(),
            cursor: cursor.cloned(),
            page_size,
            responder,
        };
        self.tx
            .send(pending)
            .map_err(|_| FeedError::transport("scripted gateway closed"))?;
        response
            .await
            .unwrap_or_else(|_| Err(FeedError::transport("scripted fetch abandoned")))
    }
}
