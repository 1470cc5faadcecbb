//! Selection tracker: at most one selected item, always drawn from the
//! current collection.

use mediafeed_core::Item;

#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: Option<Item>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Item> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|item| item.id.as_str())
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Select the first item when nothing is selected yet.
    pub fn auto_select_if_empty(&mut self, items: &[Item]) -> bool {
        if self.selected.is_some() {
            return false;
        }
        match items.first() {
            Some(first) => {
                self.selected = Some(first.clone());
                true
            }
            None => false,
        }
    }

    /// Explicitly select the item with `id`; rejected if it is not in `items`.
    pub fn select(&mut self, id: &str, items: &[Item]) -> bool {
        match items.iter().find(|item| item.id == id) {
            Some(item) => {
                self.selected = Some(item.clone());
                true
            }
            None => false,
        }
    }

    /// Re-point the selection at the fresh record with the same id, or drop
    /// it when the id left the collection.
    pub fn reconcile(&mut self, items: &[Item]) {
        let Some(id) = self.selected_id().map(str::to_owned) else {
            return;
        };
        self.selected = items.iter().find(|item| item.id == id).cloned();
    }

    pub fn select_next(&mut self, items: &[Item]) {
        if items.is_empty() {
            self.selected = None;
            return;
        }
        let next = match self.position(items) {
            Some(index) => (index + 1) % items.len(),
            None => 0,
        };
        self.selected = Some(items[next].clone());
    }

    pub fn select_previous(&mut self, items: &[Item]) {
        if items.is_empty() {
            self.selected = None;
            return;
        }
        let index = self.position(items).unwrap_or(0);
        let prev = if index == 0 {
            items.len() - 1
        } else {
            index - 1
        };
        self.selected = Some(items[prev].clone());
    }

    fn position(&self, items: &[Item]) -> Option<usize> {
        let id = self.selected_id()?;
        items.iter().position(|item| item.id == id)
    }
}
