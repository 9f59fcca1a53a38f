//! Corpus data model.
//!
//! Field names follow Rust conventions; serde renames map them onto the
//! JSON shapes served by the remote content API, so cached payloads are
//! byte-compatible with what the API returns.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// One translation/edition of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusVersion {
    #[serde(rename = "version")]
    pub id: String,
    pub name: String,
    /// Representative excerpt shown next to the version name.
    #[serde(rename = "verse")]
    pub excerpt: String,
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
}

/// A book within one version. `chapters` bounds the chapter indices `1..=chapters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub names: Vec<String>,
    #[serde(rename = "abrev")]
    pub abbreviation: String,
    pub chapters: u32,
    pub testament: Testament,
}

impl Book {
    /// First display name, falling back to the abbreviation.
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(String::as_str)
            .unwrap_or(&self.abbreviation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    #[serde(rename = "verse")]
    pub text: String,
    pub number: u32,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "vers")]
    pub verses: Vec<Verse>,
    pub chapter: u32,
    #[serde(rename = "name")]
    pub book_name: String,
    #[serde(rename = "num_chapters")]
    pub chapter_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testament: Option<Testament>,
}

impl Chapter {
    /// Check that the payload is a whole chapter for `expected_chapter`.
    ///
    /// Verse numbers must be strictly increasing but may skip (some
    /// editions omit verses); an empty verse list is a truncated payload.
    pub fn validate(&self, expected_chapter: u32) -> Result<()> {
        if self.chapter != expected_chapter {
            return Err(SyncError::InvalidData(format!(
                "expected chapter {}, got {}",
                expected_chapter, self.chapter
            )));
        }
        if self.verses.is_empty() {
            return Err(SyncError::InvalidData(format!(
                "chapter {} of {} has no verses",
                self.chapter, self.book_name
            )));
        }
        for pair in self.verses.windows(2) {
            if pair[1].number <= pair[0].number {
                return Err(SyncError::InvalidData(format!(
                    "verse numbers out of order in {} {}: {} then {}",
                    self.book_name, self.chapter, pair[0].number, pair[1].number
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    #[serde(rename = "verse")]
    pub text: String,
    pub book: String,
    pub chapter: u32,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "data")]
    pub hits: Vec<SearchHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub total: u64,
    pub page: u32,
    pub take: u32,
}
