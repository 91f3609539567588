//! Show/hide mechanics for sections, single and subtree-wide.
//!
//! Visual state lives in three places on the host: the heading's collapsed
//! class, its `aria-expanded` attribute, and the wrapper's inline `display`.
//! [`set_collapsed`] is the only function that writes them, so they always
//! agree. Persisted state is updated by the callers through
//! [`CollapsedState::mark`], and written once per user action.

use crate::dom::HostTree;
use crate::section::{Registry, Section, COLLAPSED_CLASS};
use crate::store::CollapsedState;

/// Applies the collapsed or expanded look to one section. Touches nothing persistent.
pub fn set_collapsed<T: HostTree>(tree: &mut T, section: &Section, collapsed: bool) {
    if collapsed {
        tree.add_class(section.heading, COLLAPSED_CLASS);
        tree.set_style(section.wrapper, "display", "none");
        tree.set_attribute(section.heading, "aria-expanded", "false");
    } else {
        tree.remove_class(section.heading, COLLAPSED_CLASS);
        tree.set_style(section.wrapper, "display", "");
        tree.set_attribute(section.heading, "aria-expanded", "true");
    }
}

/// Flips one section and records the new state. Returns whether it is now collapsed.
pub fn toggle<T: HostTree>(tree: &mut T, section: &Section, state: &mut CollapsedState) -> bool {
    let collapsed = !section.is_collapsed(tree);
    set_collapsed(tree, section, collapsed);
    state.mark(&section.key, collapsed);
    collapsed
}

#[must_use]
/// The section followed by every registered section nested inside its wrapper.
pub fn subtree<'a, T: HostTree>(
    tree: &T,
    registry: &'a Registry,
    section: &'a Section,
) -> Vec<&'a Section> {
    let mut members = vec![section];
    members.extend(registry.descendants(tree, section.wrapper));
    members
}

#[must_use]
/// Whether strictly more than half of `members` are collapsed.
pub fn is_mostly_collapsed<T: HostTree>(tree: &T, members: &[&Section]) -> bool {
    if members.is_empty() {
        return false;
    }
    let collapsed = members.iter().filter(|s| s.is_collapsed(tree)).count();
    collapsed * 2 > members.len()
}

/// Drives every member to the same state and records each key.
pub fn set_subtree_collapsed<T: HostTree>(
    tree: &mut T,
    members: &[&Section],
    collapse: bool,
    state: &mut CollapsedState,
) {
    for section in members {
        set_collapsed(tree, section, collapse);
        state.mark(&section.key, collapse);
    }
}

#[cfg(test)]
#[path = "tests/controller.rs"]
mod tests;
