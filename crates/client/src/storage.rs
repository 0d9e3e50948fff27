//! Durable client storage for the session slot.
//!
//! Only [`crate::Session`] talks to a storage backend; everything else reads
//! the session.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use anyhow::Context;

/// String key/value storage surviving process restarts.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// In-memory storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

/// JSON-object file storage (`{"token": "...", "currentUser": "..."}`).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file at {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("session file at {:?} is not a JSON object of strings", self.path))
    }

    fn save(&self, map: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create session directory at {:?}", parent))?;
            }
        }
        let payload = serde_json::to_string_pretty(map).context("failed to serialize session file")?;
        std::fs::write(&self.path, payload)
            .with_context(|| format!("failed to write session file at {:?}", self.path))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}

/// Resolve the default session file:
/// `{app_data_dir}/formadmin/session.json`.
pub fn default_session_path() -> PathBuf {
    let base = dirs::data_dir().or_else(|| {
        dirs::home_dir().map(|mut h| {
            h.push(".local");
            h.push("share");
            h
        })
    });

    match base {
        Some(mut dir) => {
            dir.push("formadmin");
            dir.push("session.json");
            dir
        }
        None => {
            tracing::warn!("failed to resolve OS app data directory; storing session in working directory");
            PathBuf::from("formadmin-session.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("formadmin-{}-{}", std::process::id(), name));
        p.push("session.json");
        p
    }

    #[test]
    fn memory_storage_round_trip() {
        let s = MemoryStorage::new();
        s.set("token", "abc").unwrap();
        assert_eq!(s.get("token").unwrap().as_deref(), Some("abc"));
        s.remove("token").unwrap();
        assert_eq!(s.get("token").unwrap(), None);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let path = temp_path("persist");
        let _ = std::fs::remove_file(&path);

        FileStorage::new(&path).set("token", "t-1").unwrap();
        FileStorage::new(&path).set("refreshToken", "r-1").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("t-1"));
        assert_eq!(reopened.get("refreshToken").unwrap().as_deref(), Some("r-1"));

        reopened.remove("token").unwrap();
        assert_eq!(FileStorage::new(&path).get("token").unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_storage_reports_corrupt_file() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = FileStorage::new(&path).get("token").unwrap_err();
        assert!(format!("{err:#}").contains("not a JSON object"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
