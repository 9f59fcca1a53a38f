//! Offline completeness check.
//!
//! [`CompletenessVerifier`] re-walks versions → books → chapters using only
//! what is already in the [`CacheStore`]. It holds no [`RemoteSource`], so
//! it cannot touch the network. Catalog entries are part of the walk: a
//! version whose book list is not cached is itself a gap.
//!
//! [`RemoteSource`]: crate::source::RemoteSource

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::key::CacheKey;
use crate::models::{Book, CorpusVersion};
use crate::source::require_version;
use crate::store::{load_typed, CacheStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyScope {
    /// Every version in the cached version list.
    All,
    Version(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Chapter keys derived from the cached catalogs.
    pub expected: u64,
    pub present: u64,
    /// Missing keys. Holds at most one key unless the walk was verbose.
    pub missing: Vec<CacheKey>,
}

impl VerifyReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub struct CompletenessVerifier {
    store: Arc<dyn CacheStore>,
}

impl CompletenessVerifier {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// `true` iff every expected key is cached. Stops at the first gap.
    pub async fn is_complete(&self, scope: &VerifyScope) -> Result<bool> {
        Ok(self.verify(scope, false).await?.is_complete())
    }

    /// Walk the cached hierarchy. With `verbose`, every gap is collected
    /// instead of stopping at the first one.
    pub async fn verify(&self, scope: &VerifyScope, verbose: bool) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();

        let versions: Vec<String> = match scope {
            VerifyScope::Version(version) => {
                require_version(version)?;
                vec![version.clone()]
            }
            VerifyScope::All => {
                match self
                    .catalog::<Vec<CorpusVersion>>(&CacheKey::Versions)
                    .await?
                {
                    Some(list) => list.into_iter().map(|v| v.id).collect(),
                    None => {
                        report.missing.push(CacheKey::Versions);
                        return Ok(report);
                    }
                }
            }
        };

        for version in &versions {
            let books_key = CacheKey::books(version);
            let books = match self.catalog::<Vec<Book>>(&books_key).await? {
                Some(books) => books,
                None => {
                    debug!(key = %books_key, "book catalog not cached");
                    report.missing.push(books_key);
                    if verbose {
                        continue;
                    }
                    return Ok(report);
                }
            };

            for book in &books {
                for chapter in 1..=book.chapters {
                    let key = CacheKey::chapter(version, &book.abbreviation, chapter);
                    report.expected += 1;
                    if self.store.contains(&key).await? {
                        report.present += 1;
                        continue;
                    }
                    debug!(key = %key, "chapter not cached");
                    report.missing.push(key);
                    if !verbose {
                        return Ok(report);
                    }
                }
            }
        }

        Ok(report)
    }

    async fn catalog<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        match load_typed::<T>(self.store.as_ref(), key).await {
            Ok(found) => Ok(found.map(|(value, _)| value)),
            Err(SyncError::InvalidData(reason)) => {
                warn!(key = %key, reason = %reason, "cached catalog is unreadable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Testament;
    use crate::store::memory::InMemoryCacheStore;
    use crate::store::CacheEntry;
    use crate::testing::FailingStore;
    use chrono::Utc;

    fn book(abrev: &str, chapters: u32) -> Book {
        Book {
            names: vec![abrev.to_string()],
            abbreviation: abrev.to_string(),
            chapters,
            testament: Testament::New,
        }
    }

    async fn put<T: Serialize>(store: &InMemoryCacheStore, key: CacheKey, value: &T) {
        store
            .put(CacheEntry::encode(key, value, Utc::now()).unwrap())
            .await
            .unwrap();
    }

    /// A fully mirrored "rvr" with MAT (3 chapters) and MRK (2 chapters).
    async fn mirrored() -> Arc<InMemoryCacheStore> {
        let store = Arc::new(InMemoryCacheStore::new());
        let versions = vec![CorpusVersion {
            id: "rvr".into(),
            name: "Reina Valera 1960".into(),
            excerpt: "Porque de tal manera amó Dios al mundo".into(),
            uri: "/api/read/rvr".into(),
        }];
        put(&store, CacheKey::Versions, &versions).await;
        put(&store, CacheKey::books("rvr"), &vec![book("MAT", 3), book("MRK", 2)]).await;
        for (abrev, n) in [("MAT", 3), ("MRK", 2)] {
            for chapter in 1..=n {
                put(&store, CacheKey::chapter("rvr", abrev, chapter), &"chapter").await;
            }
        }
        store
    }

    #[tokio::test]
    async fn complete_mirror_verifies() {
        let store = mirrored().await;
        let verifier = CompletenessVerifier::new(store);
        let report = verifier.verify(&VerifyScope::All, true).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.expected, 5);
        assert_eq!(report.present, 5);
    }

    #[tokio::test]
    async fn deleted_chapter_is_reported() {
        let store = mirrored().await;
        let gone = CacheKey::chapter("rvr", "MAT", 2);
        assert!(store.remove(&gone).await.unwrap());

        let verifier = CompletenessVerifier::new(store);
        assert!(!verifier.is_complete(&VerifyScope::All).await.unwrap());
        let report = verifier
            .verify(&VerifyScope::Version("rvr".into()), true)
            .await
            .unwrap();
        assert_eq!(report.missing, vec![gone]);
        assert_eq!(report.present, 4);
    }

    #[tokio::test]
    async fn verbose_enumerates_every_gap() {
        let store = mirrored().await;
        for key in [
            CacheKey::chapter("rvr", "MAT", 1),
            CacheKey::chapter("rvr", "MRK", 2),
        ] {
            store.remove(&key).await.unwrap();
        }
        let verifier = CompletenessVerifier::new(store);

        let quick = verifier.verify(&VerifyScope::All, false).await.unwrap();
        assert_eq!(quick.missing, vec![CacheKey::chapter("rvr", "MAT", 1)]);

        let full = verifier.verify(&VerifyScope::All, true).await.unwrap();
        assert_eq!(full.missing.len(), 2);
        assert_eq!(full.expected, 5);
    }

    #[tokio::test]
    async fn missing_catalogs_are_gaps() {
        let store = Arc::new(InMemoryCacheStore::new());
        let verifier = CompletenessVerifier::new(store.clone());

        let report = verifier.verify(&VerifyScope::All, true).await.unwrap();
        assert_eq!(report.missing, vec![CacheKey::Versions]);

        let report = verifier
            .verify(&VerifyScope::Version("kjv".into()), true)
            .await
            .unwrap();
        assert_eq!(report.missing, vec![CacheKey::books("kjv")]);
    }

    #[tokio::test]
    async fn unreadable_catalog_is_a_gap() {
        let store = mirrored().await;
        store
            .put(CacheEntry {
                key: CacheKey::books("rvr"),
                payload: "not json".into(),
                stored_at: Utc::now(),
            })
            .await
            .unwrap();
        let verifier = CompletenessVerifier::new(store);
        let report = verifier
            .verify(&VerifyScope::Version("rvr".into()), false)
            .await
            .unwrap();
        assert_eq!(report.missing, vec![CacheKey::books("rvr")]);
    }

    #[tokio::test]
    async fn storage_errors_propagate() {
        let verifier = CompletenessVerifier::new(Arc::new(FailingStore));
        let err = verifier.is_complete(&VerifyScope::All).await.unwrap_err();
        assert!(matches!(err, SyncError::StorageUnavailable(_)));
    }
}
