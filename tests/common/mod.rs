//! In-process mock of the remote content API.
//!
//! Corpus: `rvr` has GEN (2 chapters); `kjv` has GEN (2) and EXO (3).
//! Every chapter has three verses. Chapter requests are counted, and
//! individual chapters can be made to fail.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug)]
enum Fault {
    Status(u16),
    Garbage,
}

#[derive(Default)]
pub struct Upstream {
    requests: AtomicUsize,
    chapter_hits: AtomicUsize,
    hits_by_chapter: Mutex<HashMap<String, usize>>,
    // (book, chapter) -> (fault, remaining uses; None = permanent)
    faults: Mutex<HashMap<(String, u32), (Fault, Option<u32>)>>,
}

impl Upstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn chapter_hits(&self) -> usize {
        self.chapter_hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, version: &str, book: &str, chapter: u32) -> usize {
        let key = format!("{version}/{book}/{chapter}");
        *self.hits_by_chapter.lock().unwrap().get(&key).unwrap_or(&0)
    }

    pub fn fail_chapter(&self, book: &str, chapter: u32, status: u16) {
        self.faults
            .lock()
            .unwrap()
            .insert((book.to_string(), chapter), (Fault::Status(status), None));
    }

    pub fn fail_chapter_times(&self, book: &str, chapter: u32, status: u16, times: u32) {
        self.faults.lock().unwrap().insert(
            (book.to_string(), chapter),
            (Fault::Status(status), Some(times)),
        );
    }

    pub fn garble_chapter(&self, book: &str, chapter: u32) {
        self.faults
            .lock()
            .unwrap()
            .insert((book.to_string(), chapter), (Fault::Garbage, None));
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    fn take_fault(&self, book: &str, chapter: u32) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let key = (book.to_string(), chapter);
        let (fault, remaining) = *faults.get(&key)?;
        match remaining {
            None => Some(fault),
            Some(0) => {
                faults.remove(&key);
                None
            }
            Some(n) => {
                if n == 1 {
                    faults.remove(&key);
                } else {
                    faults.insert(key, (fault, Some(n - 1)));
                }
                Some(fault)
            }
        }
    }
}

fn books_of(version: &str) -> Option<Vec<(&'static str, &'static str, u32, &'static str)>> {
    match version {
        "rvr" => Some(vec![("GEN", "Génesis", 2, "old")]),
        "kjv" => Some(vec![
            ("GEN", "Genesis", 2, "old"),
            ("EXO", "Exodus", 3, "old"),
        ]),
        _ => None,
    }
}

pub fn verse_text(version: &str, book: &str, chapter: u32, number: u32) -> String {
    format!("{version} {book} {chapter}:{number} text")
}

fn not_found(what: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": what }))).into_response()
}

async fn versions(State(up): State<Arc<Upstream>>) -> Json<Value> {
    up.requests.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        { "name": "Reina Valera 1960", "verse": "Porque de tal manera amó Dios al mundo", "uri": "/api/read/rvr", "version": "rvr" },
        { "name": "King James Version", "verse": "For God so loved the world", "uri": "/api/read/kjv", "version": "kjv" }
    ]))
}

async fn books(
    State(up): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    up.requests.fetch_add(1, Ordering::SeqCst);
    let version = params.get("version").cloned().unwrap_or_default();
    let Some(list) = books_of(&version) else {
        return not_found(format!("unknown version {version}"));
    };
    let body: Vec<Value> = list
        .into_iter()
        .map(|(abrev, name, chapters, testament)| {
            json!({ "names": [name], "abrev": abrev, "chapters": chapters, "testament": testament })
        })
        .collect();
    Json(Value::Array(body)).into_response()
}

async fn chapter(
    State(up): State<Arc<Upstream>>,
    Path((version, book, chapter)): Path<(String, String, u32)>,
) -> Response {
    up.requests.fetch_add(1, Ordering::SeqCst);
    up.chapter_hits.fetch_add(1, Ordering::SeqCst);
    *up.hits_by_chapter
        .lock()
        .unwrap()
        .entry(format!("{version}/{book}/{chapter}"))
        .or_insert(0) += 1;

    match up.take_fault(&book, chapter) {
        Some(Fault::Status(code)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, "upstream failure").into_response();
        }
        Some(Fault::Garbage) => return (StatusCode::OK, "<html>oops</html>").into_response(),
        None => {}
    }

    let found = books_of(&version)
        .and_then(|list| list.into_iter().find(|(abrev, ..)| *abrev == book));
    let Some((abrev, name, chapters, testament)) = found else {
        return not_found(format!("unknown book {version}/{book}"));
    };
    if chapter == 0 || chapter > chapters {
        return not_found(format!("unknown chapter {version}/{abrev}/{chapter}"));
    }

    let vers: Vec<Value> = (1..=3)
        .map(|n| {
            json!({
                "verse": verse_text(&version, abrev, chapter, n),
                "number": n,
                "id": chapter * 100 + n
            })
        })
        .collect();
    Json(json!({
        "vers": vers,
        "chapter": chapter,
        "name": name,
        "num_chapters": chapters,
        "testament": testament
    }))
    .into_response()
}

async fn search(
    State(up): State<Arc<Upstream>>,
    Path(version): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    up.requests.fetch_add(1, Ordering::SeqCst);
    if books_of(&version).is_none() {
        return not_found(format!("unknown version {version}"));
    }
    let q = params.get("q").cloned().unwrap_or_default();
    let take: u32 = params.get("take").and_then(|t| t.parse().ok()).unwrap_or(10);
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "data": [
            { "id": 1, "verse": format!("{q} at GEN 1:1"), "book": "GEN", "chapter": 1, "number": 1 }
        ],
        "pagination": { "page": page, "total_pages": 1, "total_results": 1 },
        "total": 1,
        "page": page,
        "take": take
    }))
    .into_response()
}

pub fn router(state: Arc<Upstream>) -> Router {
    Router::new()
        .route("/api/versions", get(versions))
        .route("/api/books", get(books))
        .route("/api/read/{version}/search", get(search))
        .route("/api/read/{version}/{book}/{chapter}", get(chapter))
        .with_state(state)
}

/// Serve on the current tokio runtime. Returns the API base URL.
pub async fn serve(state: Arc<Upstream>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// Serve from a dedicated thread, for tests that are not async.
pub fn serve_in_background(state: Arc<Upstream>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router(state)).await.unwrap();
        });
    });
    format!("http://{addr}/api")
}
