//! Per-document state bridging the host tree, the registry and persistence.
//!
//! Whoever bootstraps a document owns one [`Collapsible`] and routes the two
//! kinds of host events into it: activations on headings and child-list
//! mutations, plus a poll once the debounce deadline passes. Everything runs
//! on the caller's thread; the context holds no locks and never blocks.

use crate::config::Config;
use crate::controller;
use crate::dom::{Activation, HostTree};
use crate::processor;
use crate::section::{Registry, Section};
use crate::store::{BlobStore, CollapsedState, StateStore};
use crate::watcher::MutationWatcher;
use std::time::Instant;

/// Root attribute marking a document as already handled by some context.
pub const INIT_ATTRIBUTE: &str = "data-mcs-init";

#[derive(Clone, Debug, PartialEq, Eq)]
/// What an activation did.
pub enum ActivationOutcome {
    /// Not on a registered heading, or aimed at a link or button inside one.
    Ignored,
    /// A single section flipped.
    Toggled {
        /// Key of the section.
        key: String,
        /// New state.
        collapsed: bool,
    },
    /// A section and everything nested in it were driven to one state.
    ToggledSubtree {
        /// State every member now has.
        collapsed: bool,
        /// Number of sections affected, the activated one included.
        sections: usize,
    },
}

/// Collapsible sections for one document.
#[derive(Debug)]
pub struct Collapsible<B> {
    config: Config,
    registry: Registry,
    store: StateStore<B>,
    watcher: MutationWatcher,
    installed: bool,
}

impl<B: BlobStore> Collapsible<B> {
    #[must_use]
    /// Context persisting into `backend` under the configured storage key.
    pub fn new(config: Config, backend: B) -> Self {
        let store = StateStore::new(backend, config.storage_key.clone());
        let watcher = MutationWatcher::new(config.debounce());
        Self {
            config,
            registry: Registry::new(),
            store,
            watcher,
            installed: false,
        }
    }

    /// Runs the first processing pass. Any later call, from this or another
    /// context on the same document, is a no-op returning `false`.
    pub fn install<T: HostTree>(&mut self, tree: &mut T) -> bool {
        let root = tree.root();
        if self.installed || tree.attribute(root, INIT_ATTRIBUTE).is_some() {
            log::debug!("document already initialised, skipping");
            return false;
        }
        tree.set_attribute(root, INIT_ATTRIBUTE, "true");
        self.installed = true;
        self.process_document(tree);
        true
    }

    #[must_use]
    /// Whether [`Self::install`] has run on this context.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Full processing pass. Returns how many sections it created.
    pub fn process_document<T: HostTree>(&mut self, tree: &mut T) -> usize {
        let state = self.store.load();
        let created = processor::process_all(tree, &mut self.registry, &state, &self.config);
        // Anything queued so far, including this pass's own wrapping, has been seen.
        tree.take_mutations();
        created
    }

    /// Drains the host's mutation queue and schedules a re-scan if headings came in.
    pub fn on_mutations<T: HostTree>(&mut self, tree: &mut T, now: Instant) -> bool {
        let records = tree.take_mutations();
        if !self.installed {
            return false;
        }
        self.watcher.observe(tree, &records, now)
    }

    #[must_use]
    /// Deadline of the pending re-scan, if any.
    pub fn pending_rescan(&self) -> Option<Instant> {
        self.watcher.deadline()
    }

    /// Runs the pending re-scan if it is due. Returns how many sections it created.
    pub fn poll<T: HostTree>(&mut self, tree: &mut T, now: Instant) -> usize {
        if self.watcher.fire(now) {
            self.process_document(tree)
        } else {
            0
        }
    }

    /// Handles an activation delivered to a heading.
    ///
    /// A plain activation flips that section. With the secondary modifier the
    /// section and all nested sections are collapsed together, unless more
    /// than half of them already are, in which case they are all expanded.
    /// Either way the persisted state is written once.
    pub fn handle_activation<T: HostTree>(
        &mut self,
        tree: &mut T,
        activation: &Activation,
    ) -> ActivationOutcome {
        if matches!(tree.tag(activation.target), Some("a" | "button")) {
            return ActivationOutcome::Ignored;
        }
        let Some(section) = self.registry.find_by_heading(activation.current) else {
            return ActivationOutcome::Ignored;
        };

        let mut state = self.store.load();
        let outcome = if activation.modifiers.is_secondary() {
            let members = controller::subtree(tree, &self.registry, section);
            let collapse = !controller::is_mostly_collapsed(tree, &members);
            controller::set_subtree_collapsed(tree, &members, collapse, &mut state);
            ActivationOutcome::ToggledSubtree {
                collapsed: collapse,
                sections: members.len(),
            }
        } else {
            let collapsed = controller::toggle(tree, section, &mut state);
            ActivationOutcome::Toggled {
                key: section.key.clone(),
                collapsed,
            }
        };
        self.store.save(&state);
        outcome
    }

    /// Collapses or expands every section still in the document, with one write.
    pub fn set_all<T: HostTree>(&mut self, tree: &mut T, collapsed: bool) -> usize {
        let members = self.registry.connected(tree);
        let mut state = self.store.load();
        controller::set_subtree_collapsed(tree, &members, collapsed, &mut state);
        self.store.save(&state);
        members.len()
    }

    #[must_use]
    /// First section in the document with the given key.
    pub fn section_for_key<T: HostTree>(&self, tree: &T, key: &str) -> Option<&Section> {
        self.registry
            .connected(tree)
            .into_iter()
            .find(|s| s.key == key)
    }

    #[must_use]
    /// Currently persisted state.
    pub fn persisted(&self) -> CollapsedState {
        self.store.load()
    }

    #[must_use]
    /// Every section registered so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    /// Persistence adapter.
    pub fn store(&self) -> &StateStore<B> {
        &self.store
    }
}

#[cfg(test)]
#[path = "tests/context.rs"]
mod tests;
