//! Read-only access to the remote content API.
//!
//! [`RemoteSource`] implementations validate their parameters with the
//! helpers in this module before issuing any request, and never retry.

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::models::{Book, Chapter, CorpusVersion, SearchPage};

/// Parameters of a paginated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub version: String,
    pub query: String,
    pub take: u32,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(version: impl Into<String>, query: impl Into<String>, take: u32, page: u32) -> Self {
        Self {
            version: version.into(),
            query: query.into(),
            take,
            page,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_version(&self.version)?;
        if self.query.trim().is_empty() {
            return Err(SyncError::InvalidRequest("query must not be empty".into()));
        }
        if self.take == 0 {
            return Err(SyncError::InvalidRequest("take must be >= 1".into()));
        }
        if self.page == 0 {
            return Err(SyncError::InvalidRequest("page must be >= 1".into()));
        }
        Ok(())
    }
}

pub fn require_version(version: &str) -> Result<()> {
    if version.trim().is_empty() {
        return Err(SyncError::InvalidRequest("version must not be empty".into()));
    }
    Ok(())
}

pub fn validate_chapter_request(version: &str, book: &str, chapter: u32) -> Result<()> {
    require_version(version)?;
    if book.trim().is_empty() {
        return Err(SyncError::InvalidRequest("book must not be empty".into()));
    }
    if chapter == 0 {
        return Err(SyncError::InvalidRequest(format!(
            "chapter number must be positive (book {book})"
        )));
    }
    Ok(())
}

/// The remote corpus, addressed by structured parameters.
///
/// Timeouts are the implementation's concern; failures surface as
/// [`SyncError::Remote`] and are never retried here.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn list_versions(&self) -> Result<Vec<CorpusVersion>>;

    async fn list_books(&self, version: &str) -> Result<Vec<Book>>;

    async fn get_chapter(&self, version: &str, book: &str, chapter: u32) -> Result<Chapter>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage>;
}
