//! Section representation for collapsible headings.
//!
//! A section pairs a heading with the wrapper element that now holds the
//! content belonging to it. Sections never store parent/child links: the
//! hierarchy is whatever the live tree says it is, since a section B is
//! nested in A exactly when A's wrapper contains B's heading. Asking the tree
//! each time keeps the answer correct after arbitrary re-renders.

use crate::dom::{HostTree, NodeId};

/// Marker on headings that have been examined; prevents re-wrapping.
pub const PROCESSED_CLASS: &str = "mcs-processed";
/// Marker on headings whose section is currently collapsed.
pub const COLLAPSED_CLASS: &str = "mcs-collapsed";
/// Class of the wrapper holding a section's content.
pub const CONTENT_CLASS: &str = "mcs-content";
/// Class of the decorative indicator inserted into headings.
pub const INDICATOR_CLASS: &str = "mcs-chevron";

#[derive(Clone, Debug, PartialEq, Eq)]
/// A heading and the wrapper owning its content.
pub struct Section {
    /// Heading element in the host tree.
    pub heading: NodeId,
    /// Wrapper element created for this section's content.
    pub wrapper: NodeId,
    /// Persistence key derived from the heading's rank and text.
    pub key: String,
}

impl Section {
    #[must_use]
    /// Collapsed state as mirrored on the heading's class list.
    pub fn is_collapsed<T: HostTree>(&self, tree: &T) -> bool {
        tree.has_class(self.heading, COLLAPSED_CLASS)
    }
}

#[derive(Debug, Default)]
/// Append-only list of every section created for a document, in creation order.
pub struct Registry {
    sections: Vec<Section>,
}

impl Registry {
    #[must_use]
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly created section.
    pub fn register(&mut self, section: Section) {
        self.sections.push(section);
    }

    #[must_use]
    /// Number of sections ever registered.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All sections, including ones whose heading has since been detached.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    #[must_use]
    /// Section owning `heading`.
    pub fn find_by_heading(&self, heading: NodeId) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    #[must_use]
    /// Sections whose heading sits inside `wrapper`, at any depth, in registration order.
    pub fn descendants<T: HostTree>(&self, tree: &T, wrapper: NodeId) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| tree.contains(wrapper, s.heading))
            .collect()
    }

    #[must_use]
    /// Sections still attached to the document.
    pub fn connected<T: HostTree>(&self, tree: &T) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| tree.is_connected(s.heading))
            .collect()
    }

    #[must_use]
    /// Nesting depth of a section: how many registered wrappers contain its heading.
    pub fn depth<T: HostTree>(&self, tree: &T, section: &Section) -> usize {
        self.sections
            .iter()
            .filter(|other| {
                other.wrapper != section.wrapper && tree.contains(other.wrapper, section.heading)
            })
            .count()
    }
}

#[cfg(test)]
#[path = "tests/section.rs"]
mod tests;
