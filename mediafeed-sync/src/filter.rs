//! Filter controller: the active section and the set of valid sections.

use mediafeed_core::{FeedError, FeedResult, Item, Section, SectionCatalog};

/// Result of a [`FilterController::set_filter`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// The requested section was already active.
    Unchanged,
    /// The active section moved away from `previous`.
    Changed { previous: Section },
}

/// Owns the active section and the discovered section set.
///
/// The set always starts with the `"all"` wildcard and only ever grows.
#[derive(Debug, Clone)]
pub struct FilterController {
    active: Section,
    sections: Vec<Section>,
    populated: bool,
}

impl FilterController {
    pub fn new(initial: Section) -> Self {
        let mut sections = vec![Section::all()];
        if !initial.is_all() {
            sections.push(initial.clone());
        }
        Self {
            active: initial,
            sections,
            populated: false,
        }
    }

    pub fn active(&self) -> &Section {
        &self.active
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_known(&self, section: &Section) -> bool {
        section.is_all() || self.sections.contains(section)
    }

    /// Whether the set has been filled from a catalog or a first page.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Switch the active section.
    ///
    /// Unknown sections are rejected and leave the controller untouched.
    pub fn set_filter(&mut self, section: Section) -> FeedResult<FilterChange> {
        if !self.is_known(&section) {
            return Err(FeedError::InvalidFilter { section });
        }
        if section == self.active {
            return Ok(FilterChange::Unchanged);
        }
        let previous = std::mem::replace(&mut self.active, section);
        Ok(FilterChange::Changed { previous })
    }

    /// Derive the section set from the first loaded page.
    ///
    /// Runs at most once; later pages never add sections through this path.
    /// Returns true if the set was derived by this call.
    pub fn discover_from_items(&mut self, items: &[Item]) -> bool {
        if self.populated {
            return false;
        }
        for item in items {
            self.insert(item.section.clone());
        }
        self.populated = true;
        true
    }

    /// Union a published catalog into the section set.
    pub fn install_catalog(&mut self, catalog: &SectionCatalog) {
        for section in &catalog.sections {
            self.insert(section.clone());
        }
        self.populated = true;
    }

    fn insert(&mut self, section: Section) {
        if !section.is_all() && !self.sections.contains(&section) {
            self.sections.push(section);
        }
    }
}

impl Default for FilterController {
    fn default() -> Self {
        Self::new(Section::all())
    }
}
