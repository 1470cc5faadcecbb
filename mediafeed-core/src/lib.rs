//! Mediafeed Core - Entity Types
//!
//! Pure data structures shared by every other crate: media items, sections,
//! pagination cursors and pages, the error taxonomy, and the fetch gateway
//! contract. This crate contains no synchronisation logic.

pub mod error;
pub mod gateway;

pub use error::{FeedError, FeedResult, FetchFailure};
pub use gateway::FetchGateway;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Reserved section value meaning "no filter".
pub const ALL_SECTIONS: &str = "all";

// ============================================================================
// ITEMS
// ============================================================================

/// A single media record as delivered by the source.
///
/// Identity is `id`. Ordering is whatever the source returned; items are
/// never re-sorted on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    pub section: Section,
    pub published_at: Timestamp,
}

impl Item {
    /// Whether this item is visible under the given filter.
    pub fn belongs_to(&self, section: &Section) -> bool {
        section.is_all() || self.section == *section
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

/// Categorical filter value. `"all"` is the reserved wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(String);

impl Section {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wildcard section matching every item.
    pub fn all() -> Self {
        Self(ALL_SECTIONS.to_string())
    }

    pub fn is_all(&self) -> bool {
        self.0 == ALL_SECTIONS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Section {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Section {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Filter catalog published by the source, when it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCatalog {
    pub sections: Vec<Section>,
}

// ============================================================================
// PAGINATION
// ============================================================================

/// Opaque resume point for "load more".
///
/// Absence of a cursor (`None` at the use site) means "start of collection".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Numeric offset into the source's ordering.
    Offset(u64),
    /// Source-defined continuation token.
    Token(String),
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Offset(offset) => write!(f, "offset:{}", offset),
            Cursor::Token(token) => write!(f, "token:{}", token),
        }
    }
}

/// One page returned by the fetch gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Item>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl Page {
    pub fn new(items: Vec<Item>, next_cursor: Option<Cursor>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    /// An empty, terminal page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), None, false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Where "more available" comes from for a given gateway.
///
/// A gateway picks exactly one; the pagination engine never mixes them
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasMorePolicy {
    /// Trust the `has_more` flag reported with each page.
    #[default]
    ServerFlag,
    /// Infer exhaustion from a page shorter than the requested size.
    ShortPage,
}

impl HasMorePolicy {
    /// Whether a page of `len` items fetched with `page_size` leaves more
    /// to fetch. Gateways use this to decide whether to hand out a cursor.
    pub fn continues(&self, has_more: bool, len: usize, page_size: usize) -> bool {
        if len == 0 {
            return false;
        }
        match self {
            HasMorePolicy::ServerFlag => has_more,
            HasMorePolicy::ShortPage => len >= page_size,
        }
    }

    /// Decide "more available" for a page fetched with `page_size`.
    ///
    /// A page without a continuation cursor is always terminal, so the flag
    /// never advertises a load that cannot be issued.
    pub fn more_available(&self, page: &Page, page_size: usize) -> bool {
        page.next_cursor.is_some() && self.continues(page.has_more, page.len(), page_size)
    }
}

/// Counter distinguishing successive replace-class fetches. Wraps at the
/// top of its range; compare epochs for equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FetchEpoch(u64);

impl FetchEpoch {
    pub fn initial() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FetchEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// STATS
// ============================================================================

/// Decorative summary of the source; not part of the pagination contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub item_count: u64,
    pub source_count: u64,
    pub oldest: Option<Timestamp>,
    pub newest: Option<Timestamp>,
    pub last_update: Option<Timestamp>,
}
