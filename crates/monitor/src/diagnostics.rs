//! Write-only side channel for debugging tools.
//!
//! The monitor mirrors its last-activity timestamp here but never reads it back.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Key under which the last-activity timestamp is stored.
pub const LAST_ACTIVITY_KEY: &str = "netlife.lastActivity";

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("diagnostic store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("diagnostic store is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("diagnostic store lock poisoned")]
    Poisoned,
}

pub trait DiagnosticStore: Send + Sync {
    /// # Errors
    ///
    /// Implementations return an error when the value could not be persisted.
    fn put(&self, key: &str, value: &str) -> Result<(), DiagnosticError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnosticStore;

impl DiagnosticStore for NoopDiagnosticStore {
    fn put(&self, _key: &str, _value: &str) -> Result<(), DiagnosticError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDiagnosticStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryDiagnosticStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok().and_then(|values| values.get(key).cloned())
    }
}

impl DiagnosticStore for MemoryDiagnosticStore {
    fn put(&self, key: &str, value: &str) -> Result<(), DiagnosticError> {
        let mut values = self.values.lock().map_err(|_| DiagnosticError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Flat JSON object on disk, rewritten on every put.
#[derive(Debug)]
pub struct FileDiagnosticStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDiagnosticStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config dir>/netlife/diagnostics.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("netlife").join("diagnostics.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, DiagnosticError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl DiagnosticStore for FileDiagnosticStore {
    fn put(&self, key: &str, value: &str) -> Result<(), DiagnosticError> {
        let _guard = self.lock.lock().map_err(|_| DiagnosticError::Poisoned)?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&map)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_memory_store_overwrites_values() {
        let store = MemoryDiagnosticStore::new();
        store.put(LAST_ACTIVITY_KEY, "a").unwrap();
        store.put(LAST_ACTIVITY_KEY, "b").unwrap();
        assert_eq!(store.get(LAST_ACTIVITY_KEY).as_deref(), Some("b"));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_file_store_creates_parent_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diagnostics.json");
        let store = FileDiagnosticStore::new(&path);

        store.put("other.key", "kept").unwrap();
        store.put(LAST_ACTIVITY_KEY, "2024-01-01T00:00:00Z").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let map: Map<String, Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map["other.key"], "kept");
        assert_eq!(map[LAST_ACTIVITY_KEY], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = FileDiagnosticStore::new(&path);
        assert!(matches!(store.put("k", "v"), Err(DiagnosticError::Serde(_))));
    }
}
