//! collapsible-sections: fold rendered documents under their headings.
//!
//! Given a rendered element tree (headings followed by their content as
//! siblings), every heading with something after it gets a wrapper holding
//! that content, an indicator glyph and an activation handler. Activating a
//! heading hides or shows its wrapper; the secondary modifier does the same
//! for the whole nested subtree. Collapsed sections are remembered by a key
//! derived from heading rank and text, so state survives re-renders and
//! reloads. The document may change at any time: mutations that bring in new
//! headings trigger a debounced, idempotent re-scan.
//!
//! The host tree is abstracted by [`dom::HostTree`]; [`dom::Document`] is an
//! in-process implementation.

pub mod config;
pub mod context;
pub mod controller;
pub mod dom;
pub mod extract;
pub mod key;
pub mod outline;
pub mod processor;
pub mod section;
pub mod store;
pub mod watcher;

pub use context::{ActivationOutcome, Collapsible};
pub use dom::{Activation, Document, HostTree, Modifiers, NodeDesc, NodeId};
pub use store::{BlobStore, CollapsedState, FileStore, MemoryStore, StateStore, StoreError};
