use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<SystemTime>,
}

/// Collection persisted in a fjall partition
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }

    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(raw) = self.partition.get(key)? else {
            debug!(key = %String::from_utf8_lossy(key), "Cache MISS");
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if entry
            .expires_at
            .is_some_and(|expires_at| SystemTime::now() > expires_at)
        {
            debug!(key = %String::from_utf8_lossy(key), "Cache entry expired");
            self.partition.remove(key)?;
            return Ok(None);
        }
        debug!(key = %String::from_utf8_lossy(key), "Cache HIT");
        Ok(Some(entry.value))
    }

    fn write(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: ttl.map(|d| SystemTime::now() + d),
        };
        self.partition.insert(key, serde_json::to_vec(&entry)?)?;
        debug!(key = %String::from_utf8_lossy(key), "Cache PUT");
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let keys = self
            .partition
            .keys()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        if let Err(e) = self.write(key, value, ttl) {
            debug!("DiskCollection put error: {}", e);
        }
    }

    async fn remove(&self, key: &[u8]) {
        if let Err(e) = self.partition.remove(key) {
            debug!("DiskCollection remove error: {}", e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.clear_all() {
            debug!("DiskCollection clear error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjall::{Config, Keyspace, PartitionCreateOptions};
    use tempfile::{TempDir, tempdir};
    use tokio::time::sleep;

    fn open_collection() -> (TempDir, Keyspace, DiskCollection) {
        let dir = tempdir().unwrap();
        let keyspace = Config::new(dir.path()).open().unwrap();
        let partition = keyspace
            .open_partition("test", PartitionCreateOptions::default())
            .unwrap();
        (dir, keyspace, DiskCollection::new(partition))
    }

    #[tokio::test]
    async fn test_disk_cache_get_put() {
        let (_dir, _keyspace, cache) = open_collection();

        assert!(cache.get(b"key1").await.is_none());

        cache.put(b"key1", b"123", None).await;
        assert_eq!(cache.get(b"key1").await, Some(b"123".to_vec()));

        assert!(cache.get(b"key2").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_ttl_expiration() {
        let (_dir, _keyspace, cache) = open_collection();

        cache
            .put(b"key1", b"123", Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(b"key1").await, Some(b"123".to_vec()));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(b"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_remove_and_clear() {
        let (_dir, _keyspace, cache) = open_collection();

        cache.put(b"key1", b"123", None).await;
        cache.put(b"key2", b"456", None).await;
        cache.remove(b"key1").await;
        assert!(cache.get(b"key1").await.is_none());
        assert_eq!(cache.get(b"key2").await, Some(b"456".to_vec()));

        cache.clear().await;
        assert!(cache.get(b"key2").await.is_none());
    }
}
