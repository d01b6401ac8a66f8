//! Best-effort durability for the notification list.
//!
//! One JSON document under one named slot. [`FileSlot`] writes with the
//! atomic write-then-rename discipline: serialize to a temp file in the same
//! directory, `fsync`, then rename over the target, so a crash mid-write
//! leaves the previous slot contents intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::notification::Notification;

/// File name of the persisted slot inside the state directory.
pub const SLOT_FILE: &str = "notifications.json";

/// Errors raised by a slot backend.
///
/// Callers inside the service treat every variant as non-fatal: failures are
/// logged and the in-memory store stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize notification list: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to read slot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("slot {path} holds malformed JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to atomically persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Storage backend holding the single notification slot.
pub trait NotificationSlot: Send + Sync {
    /// Serialize and store the full record list.
    fn save(&self, records: &[Notification]) -> Result<(), PersistError>;

    /// Read the record list back. A missing slot yields an empty list.
    fn load(&self) -> Result<Vec<Notification>, PersistError>;
}

/// File-backed slot: `<state_dir>/notifications.json`.
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create the state directory if needed and bind the slot path.
    pub fn new(state_dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = state_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PersistError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self {
            path: dir.join(SLOT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationSlot for FileSlot {
    fn save(&self, records: &[Notification]) -> Result<(), PersistError> {
        let payload = serde_json::to_vec_pretty(records)?;

        // Temp file in the same directory so the rename is a
        // same-filesystem atomic operation.
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| PersistError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        Ok(())
    }

    fn load(&self) -> Result<Vec<Notification>, PersistError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let payload = fs::read(&self.path).map_err(|e| PersistError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_slice(&payload).map_err(|e| PersistError::Malformed {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// In-memory slot for tests and ephemeral runs.
///
/// Counts saves so tests can assert whether a mutation wrote through.
#[derive(Default)]
pub struct MemorySlot {
    records: Mutex<Vec<Notification>>,
    save_count: AtomicUsize,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the slot, e.g. to test hydration.
    pub fn with_records(records: Vec<Notification>) -> Self {
        Self {
            records: Mutex::new(records),
            save_count: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

impl NotificationSlot for MemorySlot {
    fn save(&self, records: &[Notification]) -> Result<(), PersistError> {
        *self.records.lock() = records.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<Vec<Notification>, PersistError> {
        Ok(self.records.lock().clone())
    }
}
