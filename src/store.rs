//! Persisted collapsed state.
//!
//! The only durable state is a JSON object mapping section keys to `true`
//! for every collapsed section, kept under a single storage key in a
//! string-blob store. The blob store may fail in any number of ways (disabled,
//! over quota, unwritable directory); [`StateStore`] absorbs every failure so
//! the worst outcome is losing persistence, never breaking the document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures a blob store can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing file could not be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Write would exceed the store's byte quota.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        needed: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Storage is disabled in this environment.
    #[error("storage unavailable")]
    Unavailable,
}

/// Fallible string key-value store.
pub trait BlobStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
/// In-memory blob store with an optional total-size quota.
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStore {
    #[must_use]
    /// Empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Empty store holding at most `limit` bytes of keys and values.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    #[must_use]
    /// Store whose every operation fails, like storage disabled by the host.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    #[must_use]
    /// Raw stored value, bypassing failure simulation.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn size_with(&self, key: &str, value: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
            + key.len()
            + value.len()
    }
}

impl BlobStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        if let Some(limit) = self.quota {
            let needed = self.size_with(key, value);
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug)]
/// Blob store keeping one `<key>.json` file per storage key in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    /// Store rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl BlobStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Keys of collapsed sections. Collapsing writes `true`, expanding removes the key.
///
/// Values are kept as raw JSON so entries written by other tools, or with
/// other value types, survive a load and save unchanged. Any truthy value
/// counts as collapsed.
pub struct CollapsedState {
    entries: BTreeMap<String, Value>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl CollapsedState {
    #[must_use]
    /// Whether `key` is recorded as collapsed.
    pub fn is_collapsed(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(is_truthy)
    }

    /// Records `key` as collapsed, or forgets it when expanded.
    pub fn mark(&mut self, key: &str, collapsed: bool) {
        if collapsed {
            self.entries.insert(key.to_string(), Value::Bool(true));
        } else {
            self.entries.remove(key);
        }
    }

    #[must_use]
    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fails-soft adapter between [`CollapsedState`] and a [`BlobStore`].
#[derive(Debug)]
pub struct StateStore<B> {
    backend: B,
    storage_key: String,
}

impl<B: BlobStore> StateStore<B> {
    #[must_use]
    /// Adapter reading and writing the blob under `storage_key`.
    pub fn new(backend: B, storage_key: impl Into<String>) -> Self {
        Self {
            backend,
            storage_key: storage_key.into(),
        }
    }

    #[must_use]
    /// Persisted state, or an empty state if the store is missing, failing or corrupt.
    pub fn load(&self) -> CollapsedState {
        let raw = match self.backend.get_string(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CollapsedState::default(),
            Err(e) => {
                log::debug!("reading {:?} failed: {e}", self.storage_key);
                return CollapsedState::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::debug!("ignoring malformed state under {:?}: {e}", self.storage_key);
            CollapsedState::default()
        })
    }

    /// Writes the state; failures are logged and otherwise ignored.
    pub fn save(&mut self, state: &CollapsedState) {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("serialising collapsed state failed: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.set_string(&self.storage_key, &json) {
            log::warn!("persisting collapsed state failed: {e}");
        }
    }

    #[must_use]
    /// Underlying blob store.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
