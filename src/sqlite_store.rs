//! SQLite-backed [`CacheStore`].
//!
//! Each cache key maps to one row of `cache_entries`. The key column holds
//! the canonical storage form of the [`CacheKey`]; `kind` and `version` are
//! denormalized from it for statistics and maintenance queries. Every sqlx
//! failure surfaces as [`SyncError::StorageUnavailable`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use bible_sync_core::store::{CacheEntry, CacheStore};
use bible_sync_core::{CacheKey, Result, SyncError};

use crate::config::Config;
use crate::{db, migrate};

pub struct SqliteCacheStore {
    pool: SqlitePool,
}

/// Entry counts grouped by kind and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCount {
    pub kind: String,
    pub version: Option<String>,
    pub entries: i64,
    pub newest: Option<DateTime<Utc>>,
}

impl SqliteCacheStore {
    /// Open the configured database, creating the schema if it is missing.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn counts_by_kind(&self) -> Result<Vec<KindCount>> {
        let rows = sqlx::query(
            r#"
            SELECT kind, version, COUNT(*) AS entries, MAX(stored_at) AS newest
            FROM cache_entries
            GROUP BY kind, version
            ORDER BY kind, version
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|row| KindCount {
                kind: row.get("kind"),
                version: row.get("version"),
                entries: row.get("entries"),
                newest: row
                    .get::<Option<i64>, _>("newest")
                    .and_then(DateTime::from_timestamp_millis),
            })
            .collect())
    }
}

fn storage(e: sqlx::Error) -> SyncError {
    SyncError::StorageUnavailable(e.to_string())
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let row = sqlx::query("SELECT payload, stored_at FROM cache_entries WHERE key = ?")
            .bind(key.storage_key())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let millis: i64 = row.get("stored_at");
        let stored_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            SyncError::InvalidData(format!("bad timestamp {millis} for {key}"))
        })?;

        Ok(Some(CacheEntry {
            key: key.clone(),
            payload: row.get("payload"),
            stored_at,
        }))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, kind, version, payload, stored_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(entry.key.storage_key())
        .bind(entry.key.kind())
        .bind(entry.key.version())
        .bind(&entry.payload)
        .bind(entry.stored_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM cache_entries WHERE key = ?")
                .bind(key.storage_key())
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;
        Ok(found)
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key.storage_key())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(count as u64)
    }
}
