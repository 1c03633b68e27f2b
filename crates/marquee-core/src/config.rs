//! Data layer configuration.

use crate::params::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for caching and refresh behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Rows per page when the caller does not say otherwise.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Zero-subscriber entries untouched for this long are swept.
    #[serde(default = "default_evict_after_secs")]
    pub evict_after_secs: u64,
    /// A successful fetch younger than this suppresses refreshes for the
    /// same key, so subscription storms collapse into one request.
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_evict_after_secs() -> u64 {
    300
}

fn default_refresh_debounce_ms() -> u64 {
    250
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            evict_after_secs: default_evict_after_secs(),
            refresh_debounce_ms: default_refresh_debounce_ms(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn debounce(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.refresh_debounce_ms as i64)
    }

    pub fn evict_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.evict_after_secs as i64)
    }
}
