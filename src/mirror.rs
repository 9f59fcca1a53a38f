//! Wiring of the native collaborators.
//!
//! Every command that reads or syncs the corpus goes through a [`Mirror`]:
//! the SQLite store and the HTTP source combined behind one
//! [`CacheFirstFetcher`].

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use bible_sync_core::fetcher::{CacheFirstFetcher, FetchOptions};

use crate::config::Config;
use crate::http_source::HttpSource;
use crate::sqlite_store::SqliteCacheStore;

pub struct Mirror {
    pub store: Arc<SqliteCacheStore>,
    pub fetcher: Arc<CacheFirstFetcher>,
    ttl_hours: Option<u64>,
}

impl Mirror {
    pub async fn open(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteCacheStore::open(config).await?);
        let source = Arc::new(HttpSource::new(&config.remote)?);
        let fetcher = Arc::new(CacheFirstFetcher::new(store.clone(), source));
        Ok(Self {
            store,
            fetcher,
            ttl_hours: config.sync.ttl_hours,
        })
    }

    /// Fetch options for a single read command.
    pub fn fetch_options(&self, refresh: bool) -> FetchOptions {
        FetchOptions {
            force_refresh: refresh,
            ttl_hours: self.ttl_hours,
        }
    }

    /// Collect a storage fault the fetcher absorbed during a read command.
    /// Returns `true` if there was one.
    pub fn report_storage_fault(&self) -> bool {
        match self.fetcher.take_storage_fault() {
            Some(fault) => {
                warn!(error = %fault, "result was not cached");
                true
            }
            None => false,
        }
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
