//! # bible-sync
//!
//! Mirror a remote Bible corpus (versions → books → chapters) into a local
//! SQLite cache so it can be read offline.
//!
//! The sync engine lives in [`bible_sync_core`]. This crate supplies the
//! native collaborators and the `bsync` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────────────┐   ┌──────────────────┐
//! │ HttpSource  │──▶│ CacheFirstFetcher │──▶│ SqliteCacheStore │
//! │  (reqwest)  │   │  SyncOrchestrator │   │   (sqlx, WAL)    │
//! └─────────────┘   └───────────────────┘   └────────┬─────────┘
//!                                                    │
//!                                        ┌───────────┴──────────┐
//!                                        │ CompletenessVerifier │
//!                                        └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! bsync init                 # create the cache database
//! bsync sync rvr             # mirror one version
//! bsync verify --version rvr # offline completeness check
//! bsync read rvr GEN 1       # read from the cache
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `CacheStore` |
//! | [`http_source`] | HTTP `RemoteSource` |
//! | [`mirror`] | Store + source wiring |
//! | [`progress`] | stderr progress reporters |
//! | [`read`], [`search`] | Cache-first read commands |
//! | [`sync_cmd`] | Bulk sync with retries |
//! | [`verify_cmd`] | Completeness check |
//! | [`stats`] | Cache statistics and clearing |

pub mod config;
pub mod db;
pub mod http_source;
pub mod migrate;
pub mod mirror;
pub mod progress;
pub mod read;
pub mod search;
pub mod sqlite_store;
pub mod stats;
pub mod sync_cmd;
pub mod verify_cmd;
