//! Durable key-value store with versioned collections
//!
//! Three named collections (`albums`, `currentSong`, `currentAlbum`) each hold
//! JSON records under string keys. The file-backed store keeps one directory
//! per collection and one file per key; every `put` is atomic for its key
//! (write to a temp file, then rename). Nothing spans keys or collections.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

pub const DB_NAME: &str = "music-player-db";
pub const DB_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Albums,
    CurrentSong,
    CurrentAlbum,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Albums,
        Collection::CurrentSong,
        Collection::CurrentAlbum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Albums => "albums",
            Collection::CurrentSong => "currentSong",
            Collection::CurrentAlbum => "currentAlbum",
        }
    }

    /// Fixed key of the single record each collection holds
    pub fn record_key(self) -> &'static str {
        self.name()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("store schema version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError>;

    async fn put(&self, collection: Collection, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreMeta {
    name: String,
    version: u32,
}

/// File-backed store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and on first use create) the store at `root`.
    ///
    /// Safe to call repeatedly. Runs the schema upgrade when the stored version
    /// is missing or older than [`DB_VERSION`].
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| unavailable(&root, e))?;

        let meta_path = root.join(META_FILE);
        let stored_version = match tokio::fs::read_to_string(&meta_path).await {
            Ok(content) => Some(serde_json::from_str::<StoreMeta>(&content)?.version),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(unavailable(&meta_path, e)),
        };

        if let Some(found) = stored_version {
            if found > DB_VERSION {
                return Err(StoreError::VersionTooNew {
                    found,
                    supported: DB_VERSION,
                });
            }
        }

        let store = Self { root };
        if stored_version.is_none_or(|v| v < DB_VERSION) {
            tracing::info!(
                from = ?stored_version,
                to = DB_VERSION,
                path = %store.root.display(),
                "Upgrading store schema"
            );
            store.upgrade().await?;
        }

        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn upgrade(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let dir = self.root.join(collection.name());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| unavailable(&dir, e))?;
        }

        let meta = StoreMeta {
            name: DB_NAME.to_string(),
            version: DB_VERSION,
        };
        write_atomically(&self.root.join(META_FILE), &serde_json::to_vec_pretty(&meta)?).await
    }

    fn record_path(&self, collection: Collection, key: &str) -> PathBuf {
        self.root
            .join(collection.name())
            .join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(collection, key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    async fn put(&self, collection: Collection, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.record_path(collection, key);
        let bytes = serde_json::to_vec(&value)?;
        write_atomically(&path, &bytes).await
    }
}

/// In-memory store used for sessions without durable storage and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(Collection, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(&(collection, key.to_string())).cloned())
    }

    async fn put(&self, collection: Collection, key: &str, value: Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert((collection, key.to_string()), value);
        Ok(())
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| unavailable(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| unavailable(path, e))?;
    Ok(())
}

fn unavailable(path: &Path, error: std::io::Error) -> StoreError {
    match error.kind() {
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => {
            StoreError::Unavailable(format!("{}: {}", path.display(), error))
        }
        _ => StoreError::Io(error),
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn open_creates_collections_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(DB_NAME);

        let store = FileStore::open(&root).await.unwrap();
        for collection in Collection::ALL {
            assert!(root.join(collection.name()).is_dir());
        }
        store
            .put(Collection::Albums, "albums", json!([{"id": 1}]))
            .await
            .unwrap();

        let reopened = FileStore::open(&root).await.unwrap();
        let value = reopened.get(Collection::Albums, "albums").await.unwrap();
        assert_eq!(value, Some(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn missing_key_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.get(Collection::CurrentSong, "currentSong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put(Collection::CurrentSong, "currentSong", json!({"id": "a"})).await.unwrap();
        store.put(Collection::CurrentSong, "currentSong", Value::Null).await.unwrap();
        assert_eq!(
            store.get(Collection::CurrentSong, "currentSong").await.unwrap(),
            Some(Value::Null)
        );
    }

    #[tokio::test]
    async fn newer_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(META_FILE),
            serde_json::to_vec(&json!({"name": DB_NAME, "version": DB_VERSION + 1})).unwrap(),
        )
        .unwrap();

        let err = FileStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionTooNew { .. }));
    }

    #[tokio::test]
    async fn memory_store_keeps_collections_apart() {
        let store = MemoryStore::new();
        store.put(Collection::CurrentSong, "k", json!(1)).await.unwrap();
        assert!(store.get(Collection::CurrentAlbum, "k").await.unwrap().is_none());
        assert_eq!(store.get(Collection::CurrentSong, "k").await.unwrap(), Some(json!(1)));
    }

    #[test]
    fn keys_are_sanitized_for_file_names() {
        assert_eq!(sanitize_key("current/../song"), "current____song");
        assert_eq!(sanitize_key("albums"), "albums");
    }
}
