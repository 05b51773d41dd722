// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs as async_fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub key: String,
}

impl CacheMetadata {
    pub fn new(key: &str, ttl: Duration) -> Self {
        Self {
            created_at: Utc::now(),
            ttl_seconds: ttl.as_secs(),
            key: key.to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let ttl = chrono::Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));
        match self.created_at.checked_add_signed(ttl) {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub metadata: CacheMetadata,
    pub data: T,
}

impl<T> CachedData<T> {
    pub fn is_expired(&self) -> bool {
        self.metadata.is_expired()
    }
}

/// Small JSON file cache for values that outlive a single run, such as live
/// provider domains. One file per key.
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join("streamhop");

        Ok(Self { cache_dir })
    }

    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = format!("{:x}", hasher.finalize())[..16].to_string();
        self.cache_dir.join(format!("{}.json", hash))
    }

    pub async fn get_cached<T>(&self, key: &str) -> Result<Option<CachedData<T>>>
    where
        T: DeserializeOwned,
    {
        let cache_path = self.cache_path(key);
        if !async_fs::try_exists(&cache_path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = async_fs::read_to_string(&cache_path)
            .await
            .with_context(|| format!("Failed to read cache file: {}", cache_path.display()))?;

        let cached: CachedData<T> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache JSON: {}", cache_path.display()))?;

        Ok(Some(cached))
    }

    pub async fn store<T>(&self, key: &str, ttl: Duration, data: &T) -> Result<()>
    where
        T: Serialize,
    {
        async_fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create cache directory: {}",
                    self.cache_dir.display()
                )
            })?;

        let cached = CachedData {
            metadata: CacheMetadata::new(key, ttl),
            data,
        };
        let content =
            serde_json::to_string_pretty(&cached).with_context(|| "Failed to serialize cache data")?;

        let cache_path = self.cache_path(key);
        async_fs::write(&cache_path, content)
            .await
            .with_context(|| format!("Failed to write cache file: {}", cache_path.display()))?;

        Ok(())
    }

    /// Fresh entries are returned as is. Otherwise `refresh` runs and its value is
    /// stored; when it fails, a stale entry is still better than nothing.
    pub async fn get_or_refresh<T, R, Fut>(&self, key: &str, ttl: Duration, refresh: R) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cached = match self.get_cached::<T>(key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable cache entry for {}: {:#}", key, e);
                None
            }
        };

        let stale = match cached {
            Some(entry) if !entry.is_expired() => {
                debug!("Cache hit for {}", key);
                return Ok(entry.data);
            }
            other => other,
        };

        match refresh().await {
            Ok(value) => {
                if let Err(e) = self.store(key, ttl, &value).await {
                    warn!("Failed to cache {}: {:#}", key, e);
                }
                Ok(value)
            }
            Err(e) => match stale {
                Some(entry) => {
                    warn!("Refresh of {} failed, using stale value: {:#}", key, e);
                    Ok(entry.data)
                }
                None => Err(e),
            },
        }
    }

    pub async fn clear(&self) -> Result<()> {
        if async_fs::try_exists(&self.cache_dir).await.unwrap_or(false) {
            async_fs::remove_dir_all(&self.cache_dir)
                .await
                .with_context(|| {
                    format!(
                        "Failed to remove cache directory: {}",
                        self.cache_dir.display()
                    )
                })?;
        }
        Ok(())
    }
}
