//! # bible-sync core
//!
//! Runtime-agnostic engine for mirroring a remote Bible corpus
//! (versions → books → chapters) into a local cache for offline reading.
//!
//! This crate contains no tokio, sqlx, HTTP client or filesystem I/O.
//! Persistence and transport are supplied by implementing
//! [`CacheStore`](store::CacheStore) and [`RemoteSource`](source::RemoteSource).
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────┐   ┌──────────────┐
//! │ RemoteSource │──▶│ CacheFirstFetcher  │──▶│  CacheStore  │
//! └──────────────┘   └─────────▲──────────┘   └──────▲───────┘
//!                              │                     │
//!                    ┌─────────┴──────────┐   ┌──────┴───────────────┐
//!                    │  SyncOrchestrator  │   │ CompletenessVerifier │
//!                    │ + ConcurrencyLimiter│  └──────────────────────┘
//!                    └────────────────────┘
//! ```

pub mod error;
pub mod fetcher;
pub mod key;
pub mod limiter;
pub mod models;
pub mod progress;
pub mod source;
pub mod store;
pub mod sync;
pub mod verify;

#[cfg(test)]
mod testing;

pub use error::{FailedChapter, Result, SyncError};
pub use fetcher::{CacheFirstFetcher, FetchOptions, FetchStats};
pub use key::CacheKey;
pub use limiter::ConcurrencyLimiter;
pub use sync::{SyncOptions, SyncOrchestrator, SyncReport};
pub use verify::{CompletenessVerifier, VerifyReport, VerifyScope};
