//! Turning headings into interactive sections.
//!
//! A pass walks every heading in document order. Order matters: an outer
//! heading's content run swallows its deeper headings into its wrapper
//! before those headings are visited, so each nested heading is wrapped
//! inside its parent's wrapper rather than alongside it. Each heading is
//! examined at most once thanks to the processed marker, which makes a pass
//! over an unchanged document a no-op.

use crate::config::Config;
use crate::controller;
use crate::dom::{HostTree, NodeId};
use crate::extract::collect_section_content;
use crate::key::section_key;
use crate::section::{Registry, Section, CONTENT_CLASS, INDICATOR_CLASS, PROCESSED_CLASS};
use crate::store::CollapsedState;

/// Processes every heading under the root. Returns how many sections were created.
pub fn process_all<T: HostTree>(
    tree: &mut T,
    registry: &mut Registry,
    state: &CollapsedState,
    config: &Config,
) -> usize {
    let root = tree.root();
    let mut created = 0;
    for heading in tree.headings(root) {
        if process_heading(tree, registry, state, config, heading) {
            created += 1;
        }
    }
    log::debug!("processing pass created {created} section(s)");
    created
}

/// Wraps one heading's content and makes the heading interactive.
///
/// Returns `false` when the heading was already processed or has nothing
/// after it to collapse; in the latter case it is still marked so it is
/// never examined again.
pub fn process_heading<T: HostTree>(
    tree: &mut T,
    registry: &mut Registry,
    state: &CollapsedState,
    config: &Config,
    heading: NodeId,
) -> bool {
    if tree.has_class(heading, PROCESSED_CLASS) {
        return false;
    }
    tree.add_class(heading, PROCESSED_CLASS);

    let content = collect_section_content(tree, heading);
    if content.is_empty() {
        log::trace!("heading {heading:?} has no content");
        return false;
    }

    let wrapper = tree.create_element("div");
    tree.add_class(wrapper, CONTENT_CLASS);
    tree.insert_after(heading, wrapper);
    for node in content {
        tree.append_child(wrapper, node);
    }

    let section = Section {
        heading,
        wrapper,
        key: section_key(tree, heading),
    };

    decorate(tree, heading, &config.indicator);

    if state.is_collapsed(&section.key) {
        controller::set_collapsed(tree, &section, true);
    }
    tree.listen(heading);

    log::trace!("registered section {:?}", section.key);
    registry.register(section);
    true
}

fn decorate<T: HostTree>(tree: &mut T, heading: NodeId, glyph: &str) {
    let indicator = tree.create_element("span");
    tree.add_class(indicator, INDICATOR_CLASS);
    tree.set_attribute(indicator, "aria-hidden", "true");
    tree.set_style(indicator, "margin-right", "8px");
    tree.set_style(indicator, "display", "inline-flex");
    tree.set_style(indicator, "align-items", "center");
    let glyph = tree.create_text(glyph);
    tree.append_child(indicator, glyph);
    tree.prepend_child(heading, indicator);

    tree.set_style(heading, "cursor", "pointer");
    tree.set_attribute(heading, "role", "button");
    tree.set_attribute(heading, "aria-expanded", "true");
}

#[cfg(test)]
#[path = "tests/processor.rs"]
mod tests;
