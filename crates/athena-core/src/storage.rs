//! Local key-value store.
//!
//! A flat string-to-string map standing in for browser local storage. There
//! is no expiry and no schema versioning; values that need structure are
//! JSON-encoded with [`load_json`] and [`save_json`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::model::QuestionId;

/// Dashboard checkbox selection, a JSON object of quiz-set id to bool.
pub const CHECKED_ITEMS_KEY: &str = "checkedItems";
/// Last content of the notes editor.
pub const EDITOR_CONTENT_KEY: &str = "editorContent";

/// Key of the per-question loading flag.
pub fn loading_key(question_id: QuestionId) -> String {
    format!("loading:{question_id}")
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Read and decode a JSON value. A value that no longer decodes is treated as
/// absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "ignoring undecodable stored value");
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).context("failed to encode stored value")?;
    store.set(key, &raw)
}

fn lock<T>(mutex: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("store lock poisoned"))
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// A store persisted as one JSON object, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read store {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse store {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write store {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading flag
// ---------------------------------------------------------------------------

/// Marks a question as loading for as long as the guard lives.
///
/// The flag is cleared on drop, including when the guarded operation fails.
pub struct LoadingFlag<'a> {
    store: &'a dyn KeyValueStore,
    key: String,
}

impl<'a> LoadingFlag<'a> {
    pub fn set(store: &'a dyn KeyValueStore, question_id: QuestionId) -> Self {
        let key = loading_key(question_id);
        if let Err(e) = store.set(&key, "true") {
            warn!(key = %key, error = %e, "failed to set loading flag");
        }
        Self { store, key }
    }

    pub fn is_set(store: &dyn KeyValueStore, question_id: QuestionId) -> bool {
        matches!(store.get(&loading_key(question_id)), Ok(Some(v)) if v == "true")
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!(key = %self.key, error = %e, "failed to clear loading flag");
        }
    }
}
