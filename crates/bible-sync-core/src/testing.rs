//! Test doubles shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::key::CacheKey;
use crate::models::{Book, Chapter, CorpusVersion, SearchHit, SearchPage, Testament, Verse};
use crate::source::{validate_chapter_request, RemoteSource, SearchQuery};
use crate::store::memory::InMemoryCacheStore;
use crate::store::{CacheEntry, CacheStore};

/// Scripted in-process corpus with call counters and failure injection.
#[derive(Default)]
pub struct FakeSource {
    versions: Vec<CorpusVersion>,
    books: HashMap<String, Vec<Book>>,
    failures: Mutex<HashMap<(String, u32), u16>>,
    truncated: Mutex<HashSet<(String, u32)>>,
    delay: Option<Duration>,
    version_calls: AtomicUsize,
    book_calls: AtomicUsize,
    chapter_calls: AtomicUsize,
    search_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    /// `catalog` is a list of `(version, [(book, chapters)])`.
    pub fn new(catalog: &[(&str, &[(&str, u32)])]) -> Self {
        let mut versions = Vec::new();
        let mut books = HashMap::new();
        for (version, entries) in catalog {
            versions.push(CorpusVersion {
                id: version.to_string(),
                name: format!("Version {version}"),
                excerpt: "En el principio".to_string(),
                uri: format!("/api/read/{version}"),
            });
            let list = entries
                .iter()
                .map(|(abrev, chapters)| Book {
                    names: vec![abrev.to_lowercase()],
                    abbreviation: abrev.to_string(),
                    chapters: *chapters,
                    testament: Testament::Old,
                })
                .collect();
            books.insert(version.to_string(), list);
        }
        Self {
            versions,
            books,
            ..Default::default()
        }
    }

    pub fn single_book(version: &str, book: &str, chapters: u32) -> Self {
        Self::new(&[(version, &[(book, chapters)])])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_chapter(&self, book: &str, chapter: u32, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert((book.to_string(), chapter), status);
    }

    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn truncate_chapter(&self, book: &str, chapter: u32) {
        self.truncated
            .lock()
            .unwrap()
            .insert((book.to_string(), chapter));
    }

    pub fn books_for(&self, version: &str) -> Vec<Book> {
        self.books.get(version).cloned().unwrap_or_default()
    }

    pub fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    pub fn book_calls(&self) -> usize {
        self.book_calls.load(Ordering::SeqCst)
    }

    pub fn chapter_calls(&self) -> usize {
        self.chapter_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn list_versions(&self) -> Result<Vec<CorpusVersion>> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.versions.clone())
    }

    async fn list_books(&self, version: &str) -> Result<Vec<Book>> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        self.books
            .get(version)
            .cloned()
            .ok_or_else(|| SyncError::remote(Some(404), "Not Found"))
    }

    async fn get_chapter(&self, version: &str, book: &str, chapter: u32) -> Result<Chapter> {
        validate_chapter_request(version, book, chapter)?;
        self.chapter_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let id = (book.to_string(), chapter);
        if let Some(status) = self.failures.lock().unwrap().get(&id) {
            return Err(SyncError::remote(Some(*status), "Internal Server Error"));
        }
        let verses = if self.truncated.lock().unwrap().contains(&id) {
            Vec::new()
        } else {
            (1..=3)
                .map(|n| Verse {
                    text: format!("{book} {chapter}:{n}"),
                    number: n,
                    id: (chapter as u64) * 1000 + n as u64,
                    study: None,
                })
                .collect()
        };
        let chapter_count = self
            .books
            .get(version)
            .and_then(|list| list.iter().find(|b| b.abbreviation == book))
            .map(|b| b.chapters)
            .unwrap_or(0);
        Ok(Chapter {
            verses,
            chapter,
            book_name: book.to_lowercase(),
            chapter_count,
            testament: Some(Testament::Old),
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        query.validate()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SearchPage {
            hits: vec![SearchHit {
                id: 1,
                text: query.query.clone(),
                book: "GEN".to_string(),
                chapter: 1,
                number: query.page,
            }],
            pagination: None,
            total: 1,
            page: query.page,
            take: query.take,
        })
    }
}

/// A store whose backend is always gone.
pub struct FailingStore;

fn unavailable() -> SyncError {
    SyncError::StorageUnavailable("quota exceeded".to_string())
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<CacheEntry>> {
        Err(unavailable())
    }

    async fn put(&self, _entry: CacheEntry) -> Result<()> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &CacheKey) -> Result<bool> {
        Err(unavailable())
    }

    async fn clear(&self) -> Result<u64> {
        Err(unavailable())
    }

    async fn len(&self) -> Result<u64> {
        Err(unavailable())
    }
}

/// An in-memory store whose writes can be switched off and back on.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryCacheStore,
    writes_broken: AtomicBool,
}

impl FlakyStore {
    pub fn break_writes(&self) {
        self.writes_broken.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.writes_broken.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        self.inner.get(key).await
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        if self.writes_broken.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.put(entry).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<u64> {
        self.inner.clear().await
    }

    async fn len(&self) -> Result<u64> {
        self.inner.len().await
    }
}
