// src/storage.rs - Key-value persistence: byte-level providers and the typed store

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::{Error, Result, StorageOperation};

pub type StorageArc = Arc<dyn StorageProvider>;

/// Storage operations (key-value)
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
    async fn clear(&self) -> Result<()>;
}

/// Ephemeral in-process storage
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Durable storage keeping one file per key under a base directory
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.base_path.join(format!("{}.json", safe_key))
    }
}

#[async_trait]
impl StorageProvider for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_to_path(key);
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(
                key,
                StorageOperation::Read,
                format!("Failed to read key {}: {}", key, e),
            )),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_to_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(
                    key,
                    StorageOperation::Write,
                    format!("Failed to create storage directory: {}", e),
                )
            })?;
        }

        fs::write(&path, value).await.map_err(|e| {
            Error::storage(
                key,
                StorageOperation::Write,
                format!("Failed to write key {}: {}", key, e),
            )
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(
                key,
                StorageOperation::Delete,
                format!("Failed to delete key {}: {}", key, e),
            )),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage(
                    prefix,
                    StorageOperation::List,
                    format!("Failed to read storage directory: {}", e),
                ))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Error::storage(
                prefix,
                StorageOperation::List,
                format!("Failed to read storage entry: {}", e),
            )
        })? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = name.strip_suffix(".json") {
                    if key.starts_with(prefix) {
                        keys.push(key.to_string());
                    }
                }
            }
        }

        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        if self.base_path.exists() {
            fs::remove_dir_all(&self.base_path).await.map_err(|e| {
                Error::storage("", StorageOperation::Clear, format!("Failed to clear storage: {}", e))
            })?;
        }

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            Error::storage(
                "",
                StorageOperation::Clear,
                format!("Failed to recreate storage directory: {}", e),
            )
        })?;

        Ok(())
    }
}

/// Typed view over a storage provider. Values are JSON-encoded; a read that
/// finds nothing, or finds bytes it cannot decode, yields the caller's
/// default instead of an error.
#[derive(Clone)]
pub struct KvStore {
    backend: StorageArc,
}

impl KvStore {
    pub fn new(backend: StorageArc) -> Self {
        Self { backend }
    }

    /// Reads and decodes the value under `key`, falling back to `default`
    /// when the key is absent, the backend fails, or the payload does not
    /// decode. Recovery is logged, never surfaced.
    pub async fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding unreadable persisted value");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using default");
                default
            }
        }
    }

    /// Encodes `value` as JSON and persists it under `key` immediately.
    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::serialization(format!("Failed to encode key {}", key)).caused_by(e))?;
        self.backend.set(key, &bytes).await
    }

    /// Whether any value is persisted under `key`.
    pub async fn exists(&self, key: &str) -> bool {
        matches!(self.backend.get(key).await, Ok(Some(_)))
    }

    /// Removes the value under `key`.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await
    }
}

impl fmt::Debug for KvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio_test::assert_ok;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        label: String,
        count: u32,
    }

    fn memory_kv() -> KvStore {
        KvStore::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let storage = MemoryStorage::new();
        assert_ok!(storage.set("a", b"1").await);
        assert_eq!(storage.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_ok!(storage.delete("a").await);
        assert_eq!(storage.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_kv_read_returns_default_when_absent() {
        let kv = memory_kv();
        let value: Vec<Entry> = kv.read("missing", Vec::new()).await;
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_kv_read_recovers_from_corrupt_payload() {
        let kv = memory_kv();
        assert_ok!(kv.backend.set("entries", b"{not json").await);

        let fallback = vec![Entry {
            label: "fallback".to_string(),
            count: 1,
        }];
        let value: Vec<Entry> = kv.read("entries", fallback.clone()).await;
        assert_eq!(value, fallback);
    }

    #[tokio::test]
    async fn test_kv_write_then_read_is_structurally_equal() {
        let kv = memory_kv();
        let entries = vec![
            Entry {
                label: "first".to_string(),
                count: 2,
            },
            Entry {
                label: "second".to_string(),
                count: 0,
            },
        ];
        assert_ok!(kv.write("entries", &entries).await);
        let restored: Vec<Entry> = kv.read("entries", Vec::new()).await;
        assert_eq!(restored, entries);
    }

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.get("orders").await.unwrap(), None);
        assert_ok!(storage.set("orders", b"[]").await);
        assert_eq!(storage.get("orders").await.unwrap(), Some(b"[]".to_vec()));

        let keys = storage.list_keys("ord").await.unwrap();
        assert_eq!(keys, vec!["orders".to_string()]);

        assert_ok!(storage.clear().await);
        assert_eq!(storage.get("orders").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_ok!(storage.set("a/b:c", b"x").await);
        assert_eq!(storage.get("a/b:c").await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn test_file_storage_list_before_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("never-created"));
        assert_eq!(storage.list_keys("").await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_ok!(storage.delete("never-written").await);
    }
}
