//! Durable sinks for the post-turn sync.
//!
//! The engine hands each turn's changes to a [`DurableStore`] as one
//! [`SyncBatch`]. Writes happen off the turn path, one batch at a time in
//! turn order (see [`crate::sync`]), so a durable store may lag the working
//! store but never goes back to an older turn.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{StoredEntity, parse_key};
use crate::error::StoreError;

/// Name of the manifest file written by [`JsonFileStore`].
pub const MANIFEST_FILE: &str = "manifest.json";

/// Changes produced by one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncBatch {
    /// Turn that produced the changes.
    pub turn: u32,
    /// Year at the end of that turn.
    pub year: i32,
    /// Records to write.
    pub upserts: Vec<StoredEntity>,
    /// Keys to remove.
    pub deletes: Vec<String>,
}

impl SyncBatch {
    /// Whether the batch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// A sink that persists sync batches.
pub trait DurableStore: Send + Sync {
    /// Persist every change in `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any part of the write fails.
    fn write_batch(&self, batch: &SyncBatch) -> Result<(), StoreError>;
}

/// Manifest describing the last batch a [`JsonFileStore`] wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Turn of the last batch.
    pub turn: u32,
    /// Year of the last batch.
    pub year: i32,
    /// Wall-clock time of the write.
    pub saved_at: DateTime<Utc>,
}

/// One JSON file per record under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store records under `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let (kind, id) = parse_key(key)?;
        Ok(self.root.join(format!("{}_{id}.json", kind.key_prefix())))
    }

    /// Read every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be read and
    /// [`StoreError::Serialization`] if a record is malformed.
    pub fn load_all(&self) -> Result<Vec<StoredEntity>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| path.file_name().is_some_and(|name| name != MANIFEST_FILE))
            .collect();
        paths.sort();
        paths
            .iter()
            .map(|path| {
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            })
            .collect()
    }

    /// Read the manifest, if a batch has been written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the manifest exists but cannot be read.
    pub fn manifest(&self) -> Result<Option<Manifest>, StoreError> {
        let path = self.root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl DurableStore for JsonFileStore {
    fn write_batch(&self, batch: &SyncBatch) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        for entity in &batch.upserts {
            let path = self.path_for(&entity.key())?;
            std::fs::write(path, serde_json::to_string_pretty(entity)?)?;
        }
        for key in &batch.deletes {
            match std::fs::remove_file(self.path_for(key)?) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        let manifest = Manifest {
            turn: batch.turn,
            year: batch.year,
            saved_at: Utc::now(),
        };
        std::fs::write(
            self.root.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        tracing::debug!(
            turn = batch.turn,
            upserts = batch.upserts.len(),
            deletes = batch.deletes.len(),
            root = %self.root.display(),
            "Wrote sync batch to disk"
        );
        Ok(())
    }
}

/// In-process durable store, used when no directory is configured and in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    records: Mutex<BTreeMap<String, StoredEntity>>,
    turns: Mutex<Vec<u32>>,
    fail: AtomicBool,
}

impl MemoryDurableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose writes always fail.
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::Relaxed);
        store
    }

    /// Copy of the stored records.
    pub fn records(&self) -> BTreeMap<String, StoredEntity> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Turns of the batches written so far, in write order.
    pub fn turns_written(&self) -> Vec<u32> {
        self.turns
            .lock()
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }
}

impl DurableStore for MemoryDurableStore {
    fn write_batch(&self, batch: &SyncBatch) -> Result<(), StoreError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable(String::from(
                "memory store configured to fail",
            )));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        for entity in &batch.upserts {
            records.insert(entity.key(), entity.clone());
        }
        for key in &batch.deletes {
            records.remove(key);
        }
        drop(records);
        self.turns
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .push(batch.turn);
        Ok(())
    }
}
