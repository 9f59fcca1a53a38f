//! `bsync sync`: bulk mirror of one version or of every version.
//!
//! A failed run is retried by invoking the orchestrator again, up to
//! `sync.max_attempts` times, while the error is retryable. Chapters
//! cached by an earlier attempt are served from the cache, so each retry
//! only downloads what is still missing.

use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use bible_sync_core::sync::{SyncOptions, SyncOrchestrator, SyncReport};
use bible_sync_core::SyncError;

use crate::config::Config;
use crate::mirror::Mirror;
use crate::progress::ProgressMode;

/// Target that syncs every version the API lists.
pub const ALL_VERSIONS: &str = "all";

#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub refresh: bool,
    pub clear: bool,
    pub keep_going: bool,
    pub concurrency: Option<usize>,
    pub progress: ProgressMode,
}

pub async fn run_sync(config: &Config, target: &str, args: &SyncArgs) -> Result<()> {
    let mirror = Mirror::open(config).await?;
    let outcome = sync_with_retries(config, &mirror, target, args).await;
    mirror.close().await;

    match outcome {
        Ok(report) => {
            print_report(target, &report);
            Ok(())
        }
        Err(SyncError::PartialSyncFailure { failed }) => {
            for chapter in &failed {
                eprintln!("failed: {}  {}", chapter.key, chapter.reason);
            }
            anyhow::bail!(
                "sync {} incomplete: {} chapters failed",
                target,
                failed.len()
            )
        }
        Err(e) => Err(e.into()),
    }
}

async fn sync_with_retries(
    config: &Config,
    mirror: &Mirror,
    target: &str,
    args: &SyncArgs,
) -> std::result::Result<SyncReport, SyncError> {
    let reporter = args.progress.reporter();
    let max_attempts = config.sync.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let options = attempt_options(config, args, attempt);
        let orchestrator = SyncOrchestrator::new(mirror.fetcher.clone(), options)?;
        let result = if target == ALL_VERSIONS {
            orchestrator.sync_all_versions(reporter.as_ref()).await
        } else {
            orchestrator.sync_version(target, reporter.as_ref()).await
        };

        match result {
            Ok(report) => return Ok(report),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff(config.sync.retry_backoff_secs, attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %e,
                    delay_secs = delay.as_secs(),
                    "sync attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Options for the zero-based `attempt`. Clearing and forced refresh apply
/// to the first attempt only; retries resume from what is cached.
fn attempt_options(config: &Config, args: &SyncArgs, attempt: u32) -> SyncOptions {
    let first = attempt == 0;
    SyncOptions {
        concurrency: args.concurrency.unwrap_or(config.sync.concurrency),
        force_refresh: args.refresh && first,
        ttl_hours: config.sync.ttl_hours,
        clear_first: args.clear && first,
        keep_going: args.keep_going || config.sync.keep_going,
    }
}

/// `base * 2^attempt` seconds.
fn backoff(base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(base_secs.saturating_mul(1u64 << attempt.min(16)))
}

fn print_report(target: &str, report: &SyncReport) {
    println!("sync {}", target);
    println!("  versions: {}", report.versions.join(", "));
    println!("  books: {}", report.books);
    println!(
        "  chapters: {} / {}",
        report.chapters_synced, report.chapters_total
    );
    println!("  from cache: {}", report.cache_hits);
    println!("  downloaded: {}", report.remote_fetches);
    if report.cleared > 0 {
        println!("  cleared first: {}", report.cleared);
    }
    println!("ok");
}
