//! Cache-first (read-through) access to corpus entities.
//!
//! Each accessor derives the entity's [`CacheKey`], serves a valid cached
//! entry when one exists, and otherwise asks the [`RemoteSource`] and
//! writes the result through to the [`CacheStore`] before returning it.
//!
//! # Policy
//!
//! - A remote failure is returned unchanged. Nothing is written, stale
//!   entries are not served in its place, and the failure itself is not
//!   cached, so the next identical call goes to the network again.
//! - A storage failure never fails a fetch. Reads fall through to the
//!   network and writes are skipped. The first fault is logged and kept
//!   until the caller collects it with
//!   [`take_storage_fault`](CacheFirstFetcher::take_storage_fault).
//! - An entry that no longer decodes is treated as a miss and replaced.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::key::CacheKey;
use crate::models::{Book, Chapter, CorpusVersion, SearchPage};
use crate::source::{require_version, validate_chapter_request, RemoteSource, SearchQuery};
use crate::store::{is_expired, CacheEntry, CacheStore};

/// Per-call cache policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip the cache lookup and always go to the network.
    pub force_refresh: bool,
    /// Entries older than this are refetched. `None` means never expire.
    pub ttl_hours: Option<u64>,
}

impl FetchOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            ttl_hours: None,
        }
    }
}

/// Counters accumulated over the fetcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cache_hits: u64,
    pub remote_fetches: u64,
    pub writes: u64,
}

pub struct CacheFirstFetcher {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn RemoteSource>,
    storage_fault: Mutex<Option<SyncError>>,
    cache_hits: AtomicU64,
    remote_fetches: AtomicU64,
    writes: AtomicU64,
}

impl CacheFirstFetcher {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn RemoteSource>) -> Self {
        Self {
            store,
            source,
            storage_fault: Mutex::new(None),
            cache_hits: AtomicU64::new(0),
            remote_fetches: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub async fn fetch_versions(&self, opts: &FetchOptions) -> Result<Vec<CorpusVersion>> {
        let source = Arc::clone(&self.source);
        self.cached(CacheKey::Versions, opts, || async move {
            source.list_versions().await
        })
        .await
    }

    pub async fn fetch_books(&self, version: &str, opts: &FetchOptions) -> Result<Vec<Book>> {
        require_version(version)?;
        let source = Arc::clone(&self.source);
        self.cached(CacheKey::books(version), opts, || async move {
            source.list_books(version).await
        })
        .await
    }

    /// Fetch one chapter. The payload is validated before it is cached so a
    /// truncated chapter is never persisted.
    pub async fn fetch_chapter(
        &self,
        version: &str,
        book: &str,
        chapter: u32,
        opts: &FetchOptions,
    ) -> Result<Chapter> {
        validate_chapter_request(version, book, chapter)?;
        let source = Arc::clone(&self.source);
        self.cached(
            CacheKey::chapter(version, book, chapter),
            opts,
            || async move {
                let data = source.get_chapter(version, book, chapter).await?;
                data.validate(chapter)?;
                Ok(data)
            },
        )
        .await
    }

    pub async fn search(&self, query: &SearchQuery, opts: &FetchOptions) -> Result<SearchPage> {
        query.validate()?;
        let key = CacheKey::search(&query.version, &query.query, query.take, query.page);
        let source = Arc::clone(&self.source);
        self.cached(key, opts, || async move { source.search(query).await })
            .await
    }

    /// Hand over the storage fault recorded since the last call, if any.
    pub fn take_storage_fault(&self) -> Option<SyncError> {
        self.storage_fault
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    async fn cached<T, F, Fut>(&self, key: CacheKey, opts: &FetchOptions, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !opts.force_refresh {
            match self.store.get(&key).await {
                Ok(Some(entry)) if is_expired(entry.stored_at, opts.ttl_hours, Utc::now()) => {
                    debug!(key = %key, stored_at = %entry.stored_at, "cache entry expired");
                }
                Ok(Some(entry)) => match entry.decode::<T>() {
                    Ok(value) => {
                        self.cache_hits.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "cache hit");
                        return Ok(value);
                    }
                    Err(e) => warn!(key = %key, error = %e, "discarding undecodable cache entry"),
                },
                Ok(None) => {}
                Err(e) => self.record_fault(e),
            }
        }

        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
        let value = load().await?;

        let entry = CacheEntry::encode(key, &value, Utc::now())?;
        let key_label = entry.key.to_string();
        match self.store.put(entry).await {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key_label, "cached");
            }
            Err(e) => self.record_fault(e),
        }
        Ok(value)
    }

    fn record_fault(&self, err: SyncError) {
        let err = match err {
            SyncError::StorageUnavailable(_) => err,
            other => SyncError::StorageUnavailable(other.to_string()),
        };
        let mut slot = self
            .storage_fault
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_none() {
            warn!(error = %err, "cache storage unavailable, continuing network-only");
            *slot = Some(err);
        }
    }
}
