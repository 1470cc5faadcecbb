//! Pagination engine: the accumulated collection and its resume point.
//!
//! The collection is mutated only by [`PaginationEngine::replace`] and
//! [`PaginationEngine::append`]. Both update items, cursor and the "more
//! available" flag in one call, so no caller ever observes new items paired
//! with a stale cursor.

use mediafeed_core::{Cursor, HasMorePolicy, Item, Page};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct PaginationEngine {
    items: Vec<Item>,
    ids: HashSet<String>,
    cursor: Option<Cursor>,
    more_available: bool,
    policy: HasMorePolicy,
    page_size: usize,
}

impl PaginationEngine {
    pub fn new(policy: HasMorePolicy, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            cursor: None,
            more_available: true,
            policy,
            page_size,
        }
    }

    /// Clear the collection and rewind to the start of the source.
    pub fn reset(&mut self) {
        self.items.clear();
        self.ids.clear();
        self.cursor = None;
        self.more_available = true;
    }

    /// Substitute the whole collection with `page`.
    ///
    /// Repeated ids inside the page keep their first occurrence.
    pub fn replace(&mut self, page: Page) {
        let more_available = self.policy.more_available(&page, self.page_size);
        let Page {
            items, next_cursor, ..
        } = page;

        self.items.clear();
        self.ids.clear();
        let dropped = self.extend_unique(items);
        if dropped > 0 {
            tracing::warn!(dropped, "Replace page contained repeated item ids");
        }
        self.cursor = next_cursor;
        self.more_available = more_available;
    }

    /// Concatenate `page` onto the collection, preserving order.
    ///
    /// An empty page is terminal: the collection and cursor stay as they
    /// are and "more available" becomes false. Items whose id is already
    /// present are dropped. Returns the number of items actually added.
    pub fn append(&mut self, page: Page) -> usize {
        if page.is_empty() {
            self.more_available = false;
            return 0;
        }

        let more_available = self.policy.more_available(&page, self.page_size);
        let Page {
            items, next_cursor, ..
        } = page;

        let incoming = items.len();
        let dropped = self.extend_unique(items);
        if dropped > 0 {
            tracing::warn!(dropped, incoming, "Dropped already-present items from appended page");
        }
        self.cursor = next_cursor;
        self.more_available = more_available;
        incoming - dropped
    }

    fn extend_unique(&mut self, items: Vec<Item>) -> usize {
        let mut dropped = 0;
        for item in items {
            if self.ids.insert(item.id.clone()) {
                self.items.push(item);
            } else {
                dropped += 1;
            }
        }
        dropped
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        if !self.ids.contains(id) {
            return None;
        }
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn more_available(&self) -> bool {
        self.more_available
    }

    pub fn policy(&self) -> HasMorePolicy {
        self.policy
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
