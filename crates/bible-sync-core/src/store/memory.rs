//! In-memory [`CacheStore`] implementation for tests and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Locks are never held
//! across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::key::CacheKey;

use super::{CacheEntry, CacheStore};

/// In-memory store keyed by [`CacheKey::storage_key`].
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of every key currently stored.
    pub fn keys(&self) -> Vec<CacheKey> {
        match self.entries.read() {
            Ok(entries) => entries.values().map(|e| e.key.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> SyncError {
    SyncError::StorageUnavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(&key.storage_key()).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(entry.key.storage_key(), entry);
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.contains_key(&key.storage_key()))
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(&key.storage_key()).is_some())
    }

    async fn clear(&self) -> Result<u64> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let n = entries.len() as u64;
        entries.clear();
        Ok(n)
    }

    async fn len(&self) -> Result<u64> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.len() as u64)
    }
}
