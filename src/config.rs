//! Settings for storage, debounce timing and section decoration.
//!
//! `collapsible.toml` in the working directory overrides any subset of the
//! defaults; a missing or unreadable file leaves them all in place.

use facet::Facet;
use std::fs;
use std::time::Duration;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "collapsible.toml";

const DEFAULT_STORAGE_KEY: &str = "mcs-collapsed-sections";
const DEFAULT_DEBOUNCE_MS: u64 = 10;
const DEFAULT_INDICATOR: &str = "▾";
const DEFAULT_STATE_DIR: &str = ".collapsible";

#[derive(Facet, Clone, Debug, PartialEq)]
/// User preferences loaded from collapsible.toml or falling back to defaults.
pub struct Config {
    #[facet(default = DEFAULT_STORAGE_KEY.to_string())]
    /// Key the collapsed-state blob is stored under.
    pub storage_key: String,
    #[facet(default = DEFAULT_DEBOUNCE_MS)]
    /// Delay between a qualifying mutation and the re-scan it triggers.
    pub debounce_ms: u64,
    #[facet(default = DEFAULT_INDICATOR.to_string())]
    /// Glyph shown at the start of interactive headings.
    pub indicator: String,
    #[facet(default = DEFAULT_STATE_DIR.to_string())]
    /// Directory the CLI persists state into.
    pub state_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            indicator: DEFAULT_INDICATOR.to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
        }
    }
}

impl Config {
    #[must_use]
    /// Load configuration from collapsible.toml if present.
    pub fn load() -> Self {
        fs::read_to_string(CONFIG_FILE)
            .ok()
            .and_then(|contents| Self::from_toml(&contents))
            .unwrap_or_default()
    }

    #[must_use]
    /// Parse configuration from TOML, with defaults for missing fields.
    pub fn from_toml(contents: &str) -> Option<Self> {
        let config = facet_toml::from_str::<Self>(contents).ok();
        if config.is_none() {
            log::warn!("ignoring invalid {CONFIG_FILE}");
        }
        config
    }

    #[must_use]
    /// Debounce delay as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
