//! Bulk synchronization of versions → books → chapters.
//!
//! The orchestrator reads the catalog once at the start of a run, fixes the
//! expected chapter total, and then downloads each book as one batch of
//! chapter tasks through the [`ConcurrencyLimiter`]. Progress is reported
//! after each batch settles.
//!
//! # Failure policy
//!
//! A failed chapter never cancels its siblings in the same book. Once the
//! batch has settled the failure is logged and, unless
//! [`SyncOptions::keep_going`] is set, the run stops and returns
//! [`SyncError::PartialSyncFailure`] naming every failed key. Chapters that
//! did download stay cached, so re-invoking the sync resumes where it
//! stopped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FailedChapter, Result, SyncError};
use crate::fetcher::{CacheFirstFetcher, FetchOptions, FetchStats};
use crate::key::CacheKey;
use crate::limiter::ConcurrencyLimiter;
use crate::models::Book;
use crate::progress::{percent_of, SyncProgressEvent, SyncProgressReporter};
use crate::source::require_version;

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Chapter downloads in flight per book batch.
    pub concurrency: usize,
    /// Refetch catalog and chapters even when cached.
    pub force_refresh: bool,
    pub ttl_hours: Option<u64>,
    /// Clear the whole store once before the run starts.
    pub clear_first: bool,
    /// Continue with later books after a failed batch.
    pub keep_going: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            force_refresh: false,
            ttl_hours: None,
            clear_first: false,
            keep_going: false,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub versions: Vec<String>,
    pub books: u64,
    pub chapters_total: u64,
    pub chapters_synced: u64,
    pub cache_hits: u64,
    pub remote_fetches: u64,
    /// Entries removed by `clear_first`.
    pub cleared: u64,
}

pub struct SyncOrchestrator {
    fetcher: Arc<CacheFirstFetcher>,
    limiter: ConcurrencyLimiter,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(fetcher: Arc<CacheFirstFetcher>, options: SyncOptions) -> Result<Self> {
        let limiter = ConcurrencyLimiter::new(options.concurrency)?;
        Ok(Self {
            fetcher,
            limiter,
            options,
        })
    }

    pub fn fetcher(&self) -> &Arc<CacheFirstFetcher> {
        &self.fetcher
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Mirror every chapter of one version.
    pub async fn sync_version(
        &self,
        version: &str,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<SyncReport> {
        require_version(version)?;
        self.discard_stale_fault();
        let cleared = self.clear_if_requested().await?;
        reporter.report(SyncProgressEvent::Cataloging {
            version: version.to_string(),
        });
        let books = self.fetcher.fetch_books(version, &self.fetch_options()).await?;
        self.run(version, vec![(version.to_string(), books)], cleared, reporter)
            .await
    }

    /// Mirror every version the source lists.
    ///
    /// All catalogs are read before the first chapter download so the
    /// total, and with it the percentage, covers the whole run.
    pub async fn sync_all_versions(
        &self,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<SyncReport> {
        self.discard_stale_fault();
        let cleared = self.clear_if_requested().await?;
        let opts = self.fetch_options();
        let versions = self.fetcher.fetch_versions(&opts).await?;
        let mut plan = Vec::with_capacity(versions.len());
        for version in &versions {
            reporter.report(SyncProgressEvent::Cataloging {
                version: version.id.clone(),
            });
            let books = self.fetcher.fetch_books(&version.id, &opts).await?;
            plan.push((version.id.clone(), books));
        }
        self.run("all", plan, cleared, reporter).await
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            force_refresh: self.options.force_refresh,
            ttl_hours: self.options.ttl_hours,
        }
    }

    /// Drop a fault left over from work done outside a run.
    fn discard_stale_fault(&self) {
        if let Some(fault) = self.fetcher.take_storage_fault() {
            debug!(error = %fault, "discarding storage fault from before this run");
        }
    }

    async fn clear_if_requested(&self) -> Result<u64> {
        if !self.options.clear_first {
            return Ok(0);
        }
        let removed = self.fetcher.store().clear().await?;
        info!(removed, "cleared cache before sync");
        Ok(removed)
    }

    async fn run(
        &self,
        label: &str,
        plan: Vec<(String, Vec<Book>)>,
        cleared: u64,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<SyncReport> {
        let before = self.fetcher.stats();
        let total: u64 = plan
            .iter()
            .flat_map(|(_, books)| books.iter())
            .map(|book| book.chapters as u64)
            .sum();
        let mut report = SyncReport {
            versions: plan.iter().map(|(v, _)| v.clone()).collect(),
            books: plan.iter().map(|(_, books)| books.len() as u64).sum(),
            chapters_total: total,
            cleared,
            ..Default::default()
        };
        info!(
            scope = label,
            books = report.books,
            chapters = total,
            concurrency = self.limiter.limit(),
            "starting sync"
        );

        if total == 0 {
            reporter.report(SyncProgressEvent::Progress {
                version: label.to_string(),
                book: None,
                done: 0,
                total: 0,
                percent: 100,
            });
            return self.finish(report, before, Vec::new());
        }

        let opts = self.fetch_options();
        let mut done = 0u64;
        let mut failed = Vec::new();
        'versions: for (version, books) in &plan {
            for book in books {
                let batch_failures = self.sync_book(version, book, &opts).await;
                let chapters = book.chapters as u64;
                done += chapters;
                report.chapters_synced += chapters - batch_failures.len() as u64;
                reporter.report(SyncProgressEvent::Progress {
                    version: version.clone(),
                    book: Some(book.abbreviation.clone()),
                    done,
                    total,
                    percent: percent_of(done, total),
                });
                if !batch_failures.is_empty() {
                    failed.extend(batch_failures);
                    if !self.options.keep_going {
                        warn!(
                            version = %version,
                            book = %book.abbreviation,
                            "stopping sync after failed batch"
                        );
                        break 'versions;
                    }
                }
            }
        }

        self.finish(report, before, failed)
    }

    /// Download one book's chapters. Returns the chapters that failed.
    async fn sync_book(
        &self,
        version: &str,
        book: &Book,
        opts: &FetchOptions,
    ) -> Vec<FailedChapter> {
        let fetcher = &self.fetcher;
        let abbreviation = book.abbreviation.as_str();
        debug!(version, book = abbreviation, chapters = book.chapters, "syncing book");

        let tasks = (1..=book.chapters).map(move |n| {
            move || async move {
                fetcher
                    .fetch_chapter(version, abbreviation, n, opts)
                    .await
                    .map(|_| ())
                    .map_err(|e| (n, e))
            }
        });

        self.limiter
            .run(tasks)
            .await
            .into_iter()
            .filter_map(std::result::Result::err)
            .map(|(n, err)| {
                let key = CacheKey::chapter(version, abbreviation, n);
                warn!(key = %key, error = %err, "chapter download failed");
                FailedChapter {
                    key,
                    reason: err.to_string(),
                }
            })
            .collect()
    }

    fn finish(
        &self,
        mut report: SyncReport,
        before: FetchStats,
        failed: Vec<FailedChapter>,
    ) -> Result<SyncReport> {
        let after = self.fetcher.stats();
        report.cache_hits = after.cache_hits - before.cache_hits;
        report.remote_fetches = after.remote_fetches - before.remote_fetches;

        let fault = self.fetcher.take_storage_fault();
        if !failed.is_empty() {
            if let Some(fault) = fault {
                warn!(error = %fault, "cache storage failed during this run");
            }
            return Err(SyncError::PartialSyncFailure { failed });
        }
        if let Some(fault) = fault {
            return Err(fault);
        }
        info!(
            chapters = report.chapters_synced,
            cache_hits = report.cache_hits,
            remote_fetches = report.remote_fetches,
            "sync complete"
        );
        Ok(report)
    }
}
