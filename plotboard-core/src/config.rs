/// Board configuration, read from a JSON file.
/// Every field is optional in the file; missing ones take the defaults below.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::board::DEFAULT_COLUMNS;
use crate::history::DEFAULT_UNDO_LIMIT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Directory holding board and history files. Unset means the caller
    /// picks a platform location.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY.as_millis() as u64
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_delay_ms: default_autosave_delay_ms(),
            undo_limit: default_undo_limit(),
            default_columns: default_columns(),
        }
    }
}

impl BoardConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

/// Load config from path. Returns defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> BoardConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            BoardConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            BoardConfig::default()
        }
    }
}
