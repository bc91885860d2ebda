//! Durable key-value storage for the persisted document record.
//!
//! A single namespaced key holds a JSON object. The record may be shared with
//! other subsystems, so writes merge top-level keys into whatever object is
//! already stored instead of overwriting it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::{DeckError, DeckResult};

/// Backend for persisting JSON records by key.
pub trait PersistenceAdapter: Send + Sync + std::fmt::Debug {
    /// Read the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the stored data is
    /// not valid JSON.
    fn load(&self, key: &str) -> DeckResult<Option<Value>>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn store(&self, key: &str, value: &Value) -> DeckResult<()>;

    /// Merge the top-level fields of `update` into the record under `key`.
    ///
    /// An unreadable existing record is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged record cannot be written.
    fn merge(&self, key: &str, update: Map<String, Value>) -> DeckResult<()> {
        let existing = match self.load(key) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("Existing record {key} unreadable, overwriting: {e}");
                None
            }
        };
        self.store(key, &merge_objects(existing, update))
    }
}

/// Shallow-merge `update` into `existing`. A non-object `existing` is
/// discarded.
#[must_use]
pub fn merge_objects(existing: Option<Value>, update: Map<String, Value>) -> Value {
    let mut merged = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    merged.extend(update);
    Value::Object(merged)
}

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if written by another subsystem.
    #[must_use]
    pub fn with_record(self, key: impl Into<String>, value: Value) -> Self {
        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.into(), value);
        self
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn load(&self, key: &str) -> DeckResult<Option<Value>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn store(&self, key: &str, value: &Value) -> DeckResult<()> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per key in a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Use `data_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> DeckResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(key)))
    }

    /// Delete the file backing `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self, key: &str) -> DeckResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

impl PersistenceAdapter for FileStorage {
    fn load(&self, key: &str) -> DeckResult<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn store(&self, key: &str, value: &Value) -> DeckResult<()> {
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            DeckError::Storage(format!("failed to replace {}: {e}", path.display()))
        })
    }
}

/// Replace any character that is not alphanumeric, `-` or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
