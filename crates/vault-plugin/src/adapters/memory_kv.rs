use crate::domain::StoreResult;
use crate::ports::{KeyValueReadWriter, KeyValueReader};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory implementation of the replicated key-value store.
///
/// Stands in for the consensus-synchronized store in tests and local
/// simulations. Each simulated oracle holds its own replica.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.read().clone()
    }
}

impl KeyValueReader for InMemoryKeyValueStore {
    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }
}

impl KeyValueReadWriter for InMemoryKeyValueStore {
    fn write(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}
