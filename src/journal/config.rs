//! Journal configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! { "journal_path": "./data/journal.log", "sync_mode": "fsync", "create_dirs": true }
//! ```
//!
//! Only `journal_path` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{JournalError, JournalResult};

/// How an appended line is made durable before `persist` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// `File::sync_all`: data and metadata
    #[default]
    Fsync,
    /// `File::sync_data`: data only
    Fdatasync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Journal file, created on first append
    pub journal_path: PathBuf,

    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Create missing parent directories when opening for append
    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,
}

fn default_create_dirs() -> bool {
    true
}

impl JournalConfig {
    pub fn new(journal_path: impl Into<PathBuf>) -> Self {
        Self {
            journal_path: journal_path.into(),
            sync_mode: SyncMode::default(),
            create_dirs: default_create_dirs(),
        }
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> JournalResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            JournalError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: JournalConfig = serde_json::from_str(&content)
            .map_err(|e| JournalError::Config(format!("invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> JournalResult<()> {
        if self.journal_path.as_os_str().is_empty() {
            return Err(JournalError::Config(
                "journal_path must not be empty".to_string(),
            ));
        }
        if self.journal_path.is_dir() {
            return Err(JournalError::Config(format!(
                "journal_path {} is a directory",
                self.journal_path.display()
            )));
        }
        Ok(())
    }
}
