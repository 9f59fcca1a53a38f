//! Error taxonomy shared by every component of the sync engine.

use serde::Serialize;
use thiserror::Error;

use crate::key::CacheKey;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// A chapter download that did not complete during a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedChapter {
    pub key: CacheKey,
    pub reason: String,
}

#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Missing or malformed caller parameters. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream failure. `status` is `None` when no HTTP response arrived.
    #[error("remote error ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "no response".to_string()))]
    Remote { status: Option<u16>, message: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A payload that could not be decoded or failed validation.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("sync incomplete: {} chapter(s) failed", failed.len())]
    PartialSyncFailure { failed: Vec<FailedChapter> },
}

impl SyncError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        SyncError::Remote {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a remote failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether re-invoking the failed operation might succeed.
    ///
    /// Client errors (4xx other than 429), bad parameters and bad payloads
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote { status: None, .. } => true,
            SyncError::Remote {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            SyncError::StorageUnavailable(_) | SyncError::PartialSyncFailure { .. } => true,
            SyncError::InvalidRequest(_)
            | SyncError::InvalidArgument(_)
            | SyncError::InvalidData(_) => false,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidData(err.to_string())
    }
}
