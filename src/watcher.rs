//! Deciding when document mutations warrant a re-scan.
//!
//! Live previews tend to replace or append content in bursts. The watcher
//! only cares about batches that bring in headings, and coalesces them onto a
//! single pending deadline: scheduling while a re-scan is already pending
//! leaves that deadline alone, so one burst produces one re-scan.

use crate::dom::{HostTree, MutationRecord};
use std::time::{Duration, Instant};

#[must_use]
/// Whether any added node is a heading or an element containing one.
pub fn introduces_headings<T: HostTree>(tree: &T, records: &[MutationRecord]) -> bool {
    records
        .iter()
        .flat_map(|record| record.added.iter().copied())
        .filter(|&node| tree.is_element(node))
        .any(|node| tree.heading_rank(node).is_some() || !tree.headings(node).is_empty())
}

#[derive(Debug)]
/// Single-slot debounce timer for re-scans.
pub struct MutationWatcher {
    delay: Duration,
    pending: Option<Instant>,
}

impl MutationWatcher {
    #[must_use]
    /// Watcher that waits `delay` after the first qualifying batch.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Looks at a batch of records, scheduling a re-scan if it brought in headings.
    ///
    /// Returns whether the batch qualified.
    pub fn observe<T: HostTree>(&mut self, tree: &T, records: &[MutationRecord], now: Instant) -> bool {
        if !introduces_headings(tree, records) {
            return false;
        }
        if self.pending.is_none() {
            self.pending = Some(now + self.delay);
            log::debug!("re-scan scheduled in {:?}", self.delay);
        }
        true
    }

    #[must_use]
    /// When the pending re-scan is due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Clears the slot and returns `true` if the pending re-scan is due at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/watcher.rs"]
mod tests;
