//! The outline renders the visible section tree as text.
//!
//! Sections hidden inside a collapsed ancestor are left out, so the output
//! reads like what a user of the rendered document would see: collapsed
//! sections marked `▸` with nothing beneath them, expanded ones marked `▾`.

use crate::dom::HostTree;
use crate::section::{Registry, Section};

const COLLAPSED_MARK: &str = "▸";
const EXPANDED_MARK: &str = "▾";

/// Rails for every enclosing level below the top, then the branch for this entry.
///
/// `open[d]` says whether the latest entry at depth `d` still has a sibling to come.
fn branch_prefix(open: &[bool], is_last: bool) -> String {
    if open.is_empty() {
        return String::new();
    }
    let mut prefix: String = open
        .iter()
        .skip(1)
        .map(|&more| if more { "│   " } else { "    " })
        .collect();
    prefix.push_str(if is_last { "└── " } else { "├── " });
    prefix
}

fn is_visible<T: HostTree>(tree: &T, registry: &Registry, section: &Section) -> bool {
    registry.iter().all(|other| {
        other.wrapper == section.wrapper
            || !tree.contains(other.wrapper, section.heading)
            || tree.style(other.wrapper, "display") != Some("none")
    })
}

#[must_use]
/// One line per visible section, indented by nesting depth.
pub fn render<T: HostTree>(tree: &T, registry: &Registry) -> String {
    let visible: Vec<(&Section, usize)> = registry
        .connected(tree)
        .into_iter()
        .filter(|s| is_visible(tree, registry, s))
        .map(|s| (s, registry.depth(tree, s)))
        .collect();

    // Whether another entry at the same depth follows before the tree climbs back out
    let is_last_at_level: Vec<bool> = visible
        .iter()
        .enumerate()
        .map(|(i, &(_, depth))| {
            !visible[i + 1..]
                .iter()
                .take_while(|&&(_, d)| d >= depth)
                .any(|&(_, d)| d == depth)
        })
        .collect();

    let mut open: Vec<bool> = Vec::new();
    let mut out = String::new();
    for (i, &(section, depth)) in visible.iter().enumerate() {
        open.resize(depth, false);
        let prefix = branch_prefix(&open, is_last_at_level[i]);
        open.push(!is_last_at_level[i]);

        let mark = if section.is_collapsed(tree) {
            COLLAPSED_MARK
        } else {
            EXPANDED_MARK
        };
        out.push_str(&prefix);
        out.push_str(mark);
        out.push(' ');
        out.push_str(&section.key);
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
