//! Directory-backed key-value store.
//!
//! Each key maps to `<dir>/<key>.json`. Reads never fail towards the caller:
//! missing keys and unreadable documents both come back as `None`, with the
//! latter logged.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::atomic_json::{AtomicJsonFile, StorageError};

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, key: &str) -> AtomicJsonFile {
        AtomicJsonFile::new(self.dir.join(format!("{key}.json")))
    }

    /// Reads the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.file(key).load() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "[LocalStore] Failed to read key");
                None
            }
        }
    }

    /// Writes `value` under `key`; failures are logged and reported as `false`.
    pub fn set(&self, key: &str, value: &Value) -> bool {
        match self.file(key).save(value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "[LocalStore] Failed to write key");
                false
            }
        }
    }

    /// Removes `key`; failures are logged.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.file(key).remove() {
            tracing::warn!(key, error = %e, "[LocalStore] Failed to remove key");
        }
    }

    /// Locked read-modify-write of one key.
    pub fn update<F>(&self, key: &str, default_value: Value, f: F) -> Result<Value, StorageError>
    where
        F: FnOnce(&mut Value) -> Result<(), StorageError>,
    {
        self.file(key).update(default_value, f)
    }
}
