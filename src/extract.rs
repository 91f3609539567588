//! Working out which siblings belong to a heading.

use crate::dom::{HostTree, NodeId};

#[must_use]
/// Element siblings after `heading` up to, not including, the next heading of equal or higher rank.
///
/// Deeper headings are kept along with everything after them, so once the
/// run is wrapped those headings end up nested inside this section and later
/// become sections of their own. A heading followed directly by a peer (or
/// by nothing) yields an empty run.
pub fn collect_section_content<T: HostTree>(tree: &T, heading: NodeId) -> Vec<NodeId> {
    let Some(rank) = tree.heading_rank(heading) else {
        return Vec::new();
    };
    let mut content = Vec::new();
    let mut sibling = tree.next_element_sibling(heading);
    while let Some(node) = sibling {
        if tree.heading_rank(node).is_some_and(|r| r <= rank) {
            break;
        }
        content.push(node);
        sibling = tree.next_element_sibling(node);
    }
    content
}

#[cfg(test)]
#[path = "tests/extract.rs"]
mod tests;
