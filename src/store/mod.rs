pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions, PersistMode};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// A thread-safe key-value store that can hold multiple collections.
///
/// Persistent collections live in a fjall keyspace. When the keyspace can't be
/// opened they fall back to memory so callers always get a collection.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Keyspace>,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Self {
        let keyspace = match fjall::Config::new(path).open() {
            Ok(keyspace) => Some(keyspace),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not open storage, using memory");
                None
            }
        };

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    /// Flushes pending writes to disk.
    pub fn persist(&self) {
        if let Some(keyspace) = &self.keyspace {
            if let Err(e) = keyspace.persist(PersistMode::SyncAll) {
                warn!(error = %e, "Failed to persist storage");
            }
        }
    }

    fn create_collection(&self, name: &str, persist: bool) -> Arc<dyn KeyValueCollection> {
        if persist {
            let partition = self.keyspace.as_ref().and_then(|ks| {
                ks.open_partition(name, PartitionCreateOptions::default())
                    .inspect_err(|e| warn!(name, error = %e, "Failed to open partition"))
                    .ok()
            });
            if let Some(partition) = partition {
                debug!(name, "Opened persistent collection");
                return Arc::new(DiskCollection::new(partition));
            }
        }
        debug!(name, "Opened memory collection");
        Arc::new(MemoryCollection::new())
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        if let Some(collection) = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Arc::clone(collection));
        }
        if !create_if_missing {
            return None;
        }

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| self.create_collection(name, persist));
        Some(Arc::clone(collection))
    }

    fn remove_collection(&self, name: &str) -> bool {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        collections.remove(name).is_some()
    }
}
