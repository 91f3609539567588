//! Content-derived identity for headings.
//!
//! The key is `h{rank}:{text}` with the heading's visible text trimmed and cut
//! to its first [`KEY_TEXT_LEN`] characters. Two headings of the same rank
//! sharing those characters collide and share persisted state; that is a
//! known approximation, not something this module tries to detect.

use crate::dom::HostTree;
use crate::dom::NodeId;
use crate::section::INDICATOR_CLASS;

/// Number of characters of heading text that participate in the key.
pub const KEY_TEXT_LEN: usize = 50;

#[must_use]
/// Stable persistence key for a heading, ignoring the inserted indicator glyph.
///
/// Non-heading elements get rank 0, which never happens for registered sections.
pub fn section_key<T: HostTree>(tree: &T, heading: NodeId) -> String {
    let rank = tree.heading_rank(heading).unwrap_or(0);
    let text = tree.text_content_excluding(heading, INDICATOR_CLASS);
    let truncated: String = text.trim().chars().take(KEY_TEXT_LEN).collect();
    format!("h{rank}:{truncated}")
}

#[cfg(test)]
#[path = "tests/key.rs"]
mod tests;
