//! Append-only journal writer
//!
//! Every append is one `write_all` of a complete line followed by a sync.
//! `append` returns only after the line is durable; there is no batching and
//! no asynchronous write path.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::{JournalConfig, SyncMode};
use super::errors::{JournalError, JournalResult};
use super::record::JournalLine;

pub struct JournalWriter {
    path: PathBuf,
    file: File,
    sync_mode: SyncMode,
    /// Lines appended through this writer
    records_appended: u64,
}

impl JournalWriter {
    /// Opens (creating if needed) the journal for appending.
    ///
    /// A newly created file or directory is made durable by syncing the
    /// directory that holds it, so the first acknowledged line cannot
    /// vanish together with its directory entry.
    pub fn open(config: &JournalConfig) -> JournalResult<Self> {
        let path = config.journal_path.clone();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if config.create_dirs && !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| JournalError::OpenFailed {
                path: dir.clone(),
                source: e,
            })?;
            if let Some(grandparent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
                sync_dir(grandparent)?;
            }
        }

        let created = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| JournalError::OpenFailed {
                path: path.clone(),
                source: e,
            })?;

        if created {
            sync_dir(&dir)?;
            info!(path = %path.display(), "journal file created");
        }

        Ok(Self {
            path,
            file,
            sync_mode: config.sync_mode,
            records_appended: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    /// Appends one line and syncs it to disk.
    pub fn append(&mut self, line: &JournalLine) -> JournalResult<()> {
        self.file
            .write_all(line.to_line().as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| JournalError::AppendFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let synced = match self.sync_mode {
            SyncMode::Fsync => self.file.sync_all(),
            SyncMode::Fdatasync => self.file.sync_data(),
        };
        synced.map_err(|e| JournalError::SyncFailed {
            path: self.path.clone(),
            source: e,
        })?;

        self.records_appended += 1;
        debug!(hook = %line.hook, timestamp_us = line.timestamp_us, "journal line appended");

        Ok(())
    }
}

/// fsyncs a directory so entries created in it survive a crash.
fn sync_dir(dir: &Path) -> JournalResult<()> {
    let sync_failed = |e| JournalError::SyncFailed {
        path: dir.to_path_buf(),
        source: e,
    };
    let handle = OpenOptions::new().read(true).open(dir).map_err(sync_failed)?;
    handle.sync_all().map_err(sync_failed)
}
