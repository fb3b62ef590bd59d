//! Key-value storage abstractions

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A named bucket of byte keys and values. Implementations swallow their own
/// storage errors and report them as misses.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>);
    async fn remove(&self, key: &[u8]);
    async fn clear(&self);
}

pub trait Store: Send + Sync {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;

    fn remove_collection(&self, name: &str) -> bool;
}

/// Reads a JSON value. Missing and malformed entries both read as `None`.
pub async fn get_json<T: DeserializeOwned>(
    collection: &dyn KeyValueCollection,
    key: &str,
) -> Option<T> {
    let bytes = collection.get(key.as_bytes()).await?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed stored value");
            None
        }
    }
}

pub async fn put_json<T: Serialize>(
    collection: &dyn KeyValueCollection,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let bytes =
        serde_json::to_vec(value).with_context(|| format!("Failed to serialize value for {key}"))?;
    collection.put(key.as_bytes(), &bytes, ttl).await;
    Ok(())
}
