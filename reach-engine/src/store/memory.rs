//! Ordered in-memory store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{KeyValueStore, StoreError};

/// A `BTreeMap` behind a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn put_batch(&self, batch: &[(String, String)]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in batch {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn values_in_range(
        &self,
        min_key: &str,
        max_key: &str,
    ) -> Result<Vec<(String, String)>, StoreError> {
        if min_key > max_key {
            return Ok(Vec::new());
        }
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .range(min_key.to_string()..=max_key.to_string())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
