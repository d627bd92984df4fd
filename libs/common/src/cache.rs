//! Redis blob store backend
//!
//! This module provides a [`BlobStore`] implementation on top of Redis, so
//! snapshots can live outside the process when several dashboards share one
//! log.

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::{info, warn};

use crate::{
    blob_store::BlobStore,
    error::{StorageError, StorageResult},
};

/// Configuration for Redis connection
#[derive(Debug, Clone, PartialEq)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: key prefix (default: "theatre-log:")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix =
            std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "theatre-log:".to_string());

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Blob store backed by Redis string keys
pub struct RedisBlobStore {
    client: Client,
    key_prefix: String,
}

impl RedisBlobStore {
    /// Initialize a new Redis client
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisBlobStore {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn get_connection(&self) -> StorageResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StorageResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[async_trait]
impl BlobStore for RedisBlobStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut conn = self.get_connection().await?;
        let result: redis::RedisResult<()> = conn.set(self.full_key(key), value).await;

        match result {
            Ok(()) => Ok(()),
            // maxmemory reached: report it like any other quota
            Err(e) if e.code() == Some("OOM") => {
                warn!("Redis refused write to {}: {}", key, e);
                Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required: value.len(),
                    available: 0,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.full_key(key)).await?;
        Ok(())
    }
}
