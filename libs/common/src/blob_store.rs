//! Key-value blob store used for whole-collection snapshots
//!
//! Every backend stores opaque strings under short keys. Callers that keep
//! typed collections go through [`read_json`] and [`write_json`].

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    cache::{RedisBlobStore, RedisConfig},
    error::{StorageError, StorageResult},
};

/// Persistent key-value storage for serialized snapshots
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Decode the JSON snapshot stored under `key`
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

fn check_quota(
    key: &str,
    quota: Option<usize>,
    used_elsewhere: usize,
    required: usize,
) -> StorageResult<()> {
    if let Some(quota) = quota {
        let available = quota.saturating_sub(used_elsewhere);
        if required > available {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                required,
                available,
            });
        }
    }
    Ok(())
}

/// In-process blob store with an optional byte quota
///
/// The quota counts stored value bytes across all entries, the same rule
/// [`FileBlobStore`] applies.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBlobStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes past `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().await;
        let used_elsewhere: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(key, self.quota, used_elsewhere, value.len())?;

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Blob store keeping one JSON file per key inside a directory
///
/// The quota counts the bytes of every stored file.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileBlobStore {
    /// Open (and create if needed) a file store rooted at `dir`
    pub async fn open(dir: impl AsRef<Path>, quota: Option<usize>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        info!("File blob store opened at {}", dir.display());
        Ok(Self { dir, quota })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    async fn used_bytes_except(&self, skip: &Path) -> StorageResult<usize> {
        let mut used = 0usize;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path == skip || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            used += entry.metadata().await?.len() as usize;
        }
        Ok(used)
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        if self.quota.is_some() {
            let used = self.used_bytes_except(&path).await?;
            check_quota(key, self.quota, used, value.len())?;
        }

        // Write beside the target and rename so readers never see half a snapshot
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Which backend to open
#[derive(Debug, Clone, PartialEq)]
pub enum BlobBackend {
    Memory,
    File(PathBuf),
    Redis(RedisConfig),
}

/// Blob store configuration
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// Selected backend
    pub backend: BlobBackend,
    /// Optional byte quota (memory and file backends)
    pub quota_bytes: Option<usize>,
}

impl BlobStoreConfig {
    /// Create a new BlobStoreConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BLOB_STORE`: `memory`, `file` or `redis` (default: "file")
    /// - `BLOB_DIR`: directory for the file backend (default: "./data")
    /// - `BLOB_QUOTA_BYTES`: optional quota for memory and file backends
    /// - `REDIS_URL`, `REDIS_KEY_PREFIX`: see [`RedisConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let kind = std::env::var("BLOB_STORE").unwrap_or_else(|_| "file".to_string());
        let backend = match kind.to_ascii_lowercase().as_str() {
            "memory" => BlobBackend::Memory,
            "file" => BlobBackend::File(PathBuf::from(
                std::env::var("BLOB_DIR").unwrap_or_else(|_| "./data".to_string()),
            )),
            "redis" => BlobBackend::Redis(RedisConfig::from_env()?),
            other => anyhow::bail!("Unknown BLOB_STORE backend: {}", other),
        };

        let quota_bytes = std::env::var("BLOB_QUOTA_BYTES")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(Self {
            backend,
            quota_bytes,
        })
    }
}

/// Open the configured blob store backend
pub async fn open_blob_store(config: &BlobStoreConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match &config.backend {
        BlobBackend::Memory => match config.quota_bytes {
            Some(quota) => Arc::new(MemoryBlobStore::with_quota(quota)),
            None => Arc::new(MemoryBlobStore::new()),
        },
        BlobBackend::File(dir) => Arc::new(FileBlobStore::open(dir, config.quota_bytes).await?),
        BlobBackend::Redis(redis_config) => {
            let store = RedisBlobStore::new(redis_config).await?;
            if !store.health_check().await? {
                anyhow::bail!("Redis did not answer PING");
            }
            Arc::new(store)
        }
    };
    Ok(store)
}
