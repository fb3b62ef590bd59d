use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-memory collection backed by a HashMap
pub struct MemoryCollection {
    inner: Mutex<HashMap<Vec<u8>, CacheValue>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|expiry| expiry <= Instant::now()),
            None => {
                debug!(key = %String::from_utf8_lossy(key), "Cache MISS");
                return None;
            }
        };
        if expired {
            debug!(key = %String::from_utf8_lossy(key), "Cache entry expired");
            cache.remove(key);
            return None;
        }
        debug!(key = %String::from_utf8_lossy(key), "Cache HIT");
        cache.get(key).map(|entry| entry.value.clone())
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let mut cache = self.inner.lock().await;
        debug!(key = %String::from_utf8_lossy(key), "Cache PUT");
        cache.insert(
            key.to_vec(),
            CacheValue {
                value: value.to_vec(),
                expires_at,
            },
        );
    }

    async fn remove(&self, key: &[u8]) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!(key = %String::from_utf8_lossy(key), "Cache REMOVE");
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = MemoryCollection::new();

        assert!(cache.get(b"key1").await.is_none());

        cache.put(b"key1", b"123", None).await;
        assert_eq!(cache.get(b"key1").await, Some(b"123".to_vec()));

        assert!(cache.get(b"key2").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_expiration() {
        let cache = MemoryCollection::new();

        cache
            .put(b"key1", b"123", Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(b"key1").await, Some(b"123".to_vec()));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(b"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_remove() {
        let cache = MemoryCollection::new();

        cache.put(b"key1", b"123", None).await;
        cache.remove(b"key1").await;
        assert!(cache.get(b"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = MemoryCollection::new();

        cache.put(b"key1", b"123", None).await;
        cache.put(b"key2", b"456", None).await;

        cache.clear().await;

        assert!(cache.get(b"key1").await.is_none());
        assert!(cache.get(b"key2").await.is_none());
    }
}
