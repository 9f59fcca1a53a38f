//! Cache storage abstraction.
//!
//! The [`CacheStore`] trait is the persistence seam of the sync engine:
//! a key → (payload, timestamp) map. Implementations must keep a payload
//! and its timestamp in a single record so a reader never observes one
//! without the other.
//!
//! Missing keys are `Ok(None)`, never errors. Any backend failure (file
//! locked, disk full, database gone) is reported as
//! [`SyncError::StorageUnavailable`](crate::error::SyncError::StorageUnavailable)
//! so callers can decide to continue network-only.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::key::CacheKey;

/// One cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// JSON-encoded entity.
    pub payload: String,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Encode `value` as a new entry stamped with `stored_at`.
    pub fn encode<T: Serialize>(key: CacheKey, value: &T, stored_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            key,
            payload: serde_json::to_string(value)?,
            stored_at,
        })
    }

    /// Decode the payload into a typed entity.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.payload)
            .map_err(|e| SyncError::InvalidData(format!("cached {}: {}", self.key, e)))
    }
}

/// Abstract persistent key-value store for cached corpus data.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](CacheStore::get) | Read one entry |
/// | [`put`](CacheStore::put) | Insert or replace one entry |
/// | [`contains`](CacheStore::contains) | Presence check without decoding |
/// | [`remove`](CacheStore::remove) | Delete one entry |
/// | [`clear`](CacheStore::clear) | Delete every entry |
/// | [`len`](CacheStore::len) | Count entries |
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Insert or replace. Last write wins.
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    async fn contains(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns `true` if an entry was removed.
    async fn remove(&self, key: &CacheKey) -> Result<bool>;

    /// Delete everything, returning the number of entries removed.
    async fn clear(&self) -> Result<u64>;

    async fn len(&self) -> Result<u64>;
}

/// Whether an entry stored at `stored_at` has outlived `ttl_hours` at `now`.
///
/// No TTL means entries never expire.
pub fn is_expired(stored_at: DateTime<Utc>, ttl_hours: Option<u64>, now: DateTime<Utc>) -> bool {
    match ttl_hours {
        None => false,
        Some(hours) => match i64::try_from(hours).ok().and_then(Duration::try_hours) {
            Some(ttl) => now.signed_duration_since(stored_at) >= ttl,
            // Longer than chrono can represent.
            None => false,
        },
    }
}

/// Read and decode a typed entity, returning its timestamp alongside.
pub async fn load_typed<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &CacheKey,
) -> Result<Option<(T, DateTime<Utc>)>> {
    match store.get(key).await? {
        Some(entry) => Ok(Some((entry.decode()?, entry.stored_at))),
        None => Ok(None),
    }
}
