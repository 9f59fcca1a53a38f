//! Cache statistics and maintenance.
//!
//! `bsync stats` summarizes what is mirrored: entry counts per kind and
//! version, the newest write per group and the database size. `bsync clear`
//! empties the cache.

use anyhow::Result;
use chrono::{DateTime, Utc};

use bible_sync_core::store::CacheStore;

use crate::config::Config;
use crate::progress::format_number;
use crate::sqlite_store::{KindCount, SqliteCacheStore};

pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteCacheStore::open(config).await?;
    let total = store.len().await;
    let groups = store.counts_by_kind().await;
    store.close().await;
    let (total, groups) = (total?, groups?);

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("bible-sync cache");
    println!("================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Entries:     {}", format_number(total));

    if !groups.is_empty() {
        println!();
        print!("{}", render_groups(&groups, Utc::now()));
    }
    println!();
    Ok(())
}

fn render_groups(groups: &[KindCount], now: DateTime<Utc>) -> String {
    let mut out = format!(
        "  {:<10} {:<12} {:>8}   {}\n",
        "KIND", "VERSION", "ENTRIES", "LAST WRITE"
    );
    out.push_str(&format!("  {}\n", "-".repeat(52)));
    for g in groups {
        let written = match g.newest {
            Some(ts) => format_ts_relative(ts, now),
            None => "never".to_string(),
        };
        out.push_str(&format!(
            "  {:<10} {:<12} {:>8}   {}\n",
            g.kind,
            g.version.as_deref().unwrap_or("-"),
            format_number(g.entries.max(0) as u64),
            written
        ));
    }
    out
}

pub async fn run_clear(config: &Config) -> Result<()> {
    let store = SqliteCacheStore::open(config).await?;
    let removed = store.clear().await;
    store.close().await;
    let removed = removed?;
    tracing::info!(removed, "cleared cache");
    println!("Removed {} cache entries.", format_number(removed));
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// "3 hours ago" style, falling back to a date for old or future stamps.
fn format_ts_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - ts).num_seconds();
    if delta < 0 {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}
