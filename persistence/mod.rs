/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canvas persistence over a string key-value store.
//!
//! Architecture:
//! - `KeyValueStore` is the storage seam (`get`/`set`/`remove`)
//! - `PersistenceBridge` writes the whole canvas document under `canvasState`,
//!   debounced so bursts of mutations coalesce into one write
//! - On startup: `load()` once, before any expansion can run
//!
//! Writes are fire-and-forget: failures are logged and dropped. A corrupt
//! document loads as `None`.

pub mod export;
pub mod types;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use types::CanvasDocument;

pub const CANVAS_STATE_KEY: &str = "canvasState";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Minimal string storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a data directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open or create a store at the given directory
    pub fn open(base_dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| StorageError::Io(format!("Failed to create dir: {e}")))?;
        Ok(Self { base_dir })
    }

    /// `<config dir>/lexigraph`, or `None` when the platform has no config dir.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lexigraph"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key).ok()?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                None
            },
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write then rename so readers never see a torn file.
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {key}: {e}")))?;
        std::fs::rename(&staging, &path)
            .map_err(|e| StorageError::Io(format!("Failed to replace {key}: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!("Failed to remove {key}: {e}"))),
        }
    }
}

struct PendingWrite {
    document: CanvasDocument,
    due: Instant,
}

/// Debounced writer for the canvas document.
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
    debounce: Duration,
    pending: Mutex<Option<PendingWrite>>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            pending: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read the persisted document once. Absent or unparsable yields `None`.
    pub fn load(&self) -> Option<CanvasDocument> {
        let raw = self.store.get(CANVAS_STATE_KEY)?;
        match CanvasDocument::from_json(&raw) {
            Ok(document) => {
                info!(
                    "Loaded canvas with {} nodes and {} edges",
                    document.nodes.len(),
                    document.edges.len()
                );
                Some(document)
            },
            Err(e) => {
                warn!("Discarding corrupt canvas state: {e}");
                None
            },
        }
    }

    /// Queue `document` as the latest state, due one debounce period from now.
    pub fn schedule(&self, document: CanvasDocument) {
        self.schedule_at(document, Instant::now());
    }

    pub fn schedule_at(&self, document: CanvasDocument, now: Instant) {
        if self.debounce.is_zero() {
            self.pending.lock().take();
            self.write(&document);
            return;
        }
        *self.pending.lock() = Some(PendingWrite {
            document,
            due: now + self.debounce,
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Write the pending document if its deadline has passed.
    pub fn flush_due(&self, now: Instant) -> bool {
        let pending = {
            let mut slot = self.pending.lock();
            let is_due = slot.as_ref().is_some_and(|write| write.due <= now);
            if is_due { slot.take() } else { None }
        };
        match pending {
            Some(write) => {
                self.write(&write.document);
                true
            },
            None => false,
        }
    }

    /// Write the pending document now, whatever its deadline.
    pub fn flush(&self) -> bool {
        let pending = self.pending.lock().take();
        match pending {
            Some(write) => {
                self.write(&write.document);
                true
            },
            None => false,
        }
    }

    /// Drop any pending write and remove the stored document.
    pub fn clear(&self) {
        self.pending.lock().take();
        if let Err(e) = self.store.remove(CANVAS_STATE_KEY) {
            warn!("Failed to remove canvas state: {e}");
        }
    }

    fn write(&self, document: &CanvasDocument) {
        let raw = match document.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize canvas state: {e}");
                return;
            },
        };
        match self.store.set(CANVAS_STATE_KEY, &raw) {
            Ok(()) => debug!("Saved canvas state ({} bytes)", raw.len()),
            Err(e) => warn!("Failed to save canvas state: {e}"),
        }
    }

    /// Flush due writes every `tick` until `cancel` fires, then flush once more.
    pub fn spawn_autosave(
        self: Arc<Self>,
        tick: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        self.flush();
                        debug!("Autosave stopped");
                        break;
                    }

                    _ = interval.tick() => {
                        self.flush_due(Instant::now());
                    }
                }
            }
        })
    }
}

#[derive(Debug)]
pub enum StorageError {
    Io(String),
    InvalidKey(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {e}"),
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: '{key}'"),
        }
    }
}

impl std::error::Error for StorageError {}
