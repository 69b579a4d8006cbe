//! Generic key-value substrate behind the report store.
//!
//! The persisted contract is string-payload get/set under a fixed key —
//! the substrate itself (sled on disk, a map in tests) is interchangeable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

/// Storage substrate errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// String-payload key-value store.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Sled-backed store for the server binary.
#[derive(Clone)]
pub struct SledKv {
    db: sled::Db,
}

impl SledKv {
    /// Open or create the database at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl KvStore for SledKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.db.get(key)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(key, value.as_bytes())?;
        // Mutations are rare user actions; flush so a crash cannot lose
        // an acknowledged write.
        self.db.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

/// In-memory store for tests and minimal deployments.
///
/// Thread-safe via `RwLock`. Not durable — data lost on restart.
#[derive(Default)]
pub struct MemoryKv {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self
            .map
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self
            .map
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let kv = MemoryKv::new();
        assert!(kv.get("missing").unwrap().is_none());
        kv.set("k", "v1").unwrap();
        kv.set("k", "v2").unwrap();
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn sled_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let kv = SledKv::open(dir.path().join("kv.db")).unwrap();
        kv.set("reports", "{}").unwrap();
        assert_eq!(kv.get("reports").unwrap().as_deref(), Some("{}"));
        assert_eq!(kv.backend_name(), "sled");
    }

    #[test]
    fn trait_object_usage() {
        let kv: Box<dyn KvStore> = Box::new(MemoryKv::new());
        kv.set("a", "1").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("1"));
    }
}
