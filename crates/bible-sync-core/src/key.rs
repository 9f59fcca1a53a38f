//! Structured cache keys.
//!
//! Every cached lookup is addressed by a [`CacheKey`]. The storage form is
//! the canonical JSON encoding of the key, so distinct parameter tuples can
//! never collide on the same string (separators inside a book abbreviation
//! or a search query are escaped by the encoder, not concatenated).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKey {
    Versions,
    Books {
        version: String,
    },
    Chapter {
        version: String,
        book: String,
        chapter: u32,
    },
    Search {
        version: String,
        query: String,
        take: u32,
        page: u32,
    },
}

impl CacheKey {
    pub fn books(version: impl Into<String>) -> Self {
        CacheKey::Books {
            version: version.into(),
        }
    }

    pub fn chapter(version: impl Into<String>, book: impl Into<String>, chapter: u32) -> Self {
        CacheKey::Chapter {
            version: version.into(),
            book: book.into(),
            chapter,
        }
    }

    pub fn search(
        version: impl Into<String>,
        query: impl Into<String>,
        take: u32,
        page: u32,
    ) -> Self {
        CacheKey::Search {
            version: version.into(),
            query: query.into(),
            take,
            page,
        }
    }

    /// Short tag for the entity kind, used as an indexed column by stores.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::Versions => "versions",
            CacheKey::Books { .. } => "books",
            CacheKey::Chapter { .. } => "chapter",
            CacheKey::Search { .. } => "search",
        }
    }

    /// The corpus version the key belongs to, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            CacheKey::Versions => None,
            CacheKey::Books { version }
            | CacheKey::Chapter { version, .. }
            | CacheKey::Search { version, .. } => Some(version),
        }
    }

    /// Canonical string form used as the primary key in persistent stores.
    pub fn storage_key(&self) -> String {
        // Serializing a plain enum of strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a key previously produced by [`storage_key`](Self::storage_key).
    pub fn from_storage_key(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| SyncError::InvalidData(format!("bad cache key {raw:?}: {e}")))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Versions => write!(f, "versions"),
            CacheKey::Books { version } => write!(f, "books/{version}"),
            CacheKey::Chapter {
                version,
                book,
                chapter,
            } => write!(f, "{version}/{book}/{chapter}"),
            CacheKey::Search {
                version,
                query,
                take,
                page,
            } => write!(f, "search/{version}?q={query:?}&take={take}&page={page}"),
        }
    }
}
