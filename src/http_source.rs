//! [`RemoteSource`] over the remote content API.
//!
//! Endpoints, relative to `remote.base_url`:
//!
//! | Call | Request |
//! |------|---------|
//! | `list_versions` | `GET /versions` |
//! | `list_books` | `GET /books?version=V` |
//! | `get_chapter` | `GET /read/{version}/{book}/{chapter}` |
//! | `search` | `GET /read/{version}/search?q=&take=&page=` |
//!
//! Parameters are validated before a request is built. Path segments and
//! query values are percent-encoded by [`Url`]. Every request carries the
//! configured timeout; nothing is retried here.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use bible_sync_core::models::{Book, Chapter, CorpusVersion, SearchPage};
use bible_sync_core::source::{
    require_version, validate_chapter_request, RemoteSource, SearchQuery,
};
use bible_sync_core::{Result, SyncError};

use crate::config::RemoteConfig;

pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("invalid remote.base_url: {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("remote.base_url cannot be used as a base: {}", config.base_url);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SyncError::remote(None, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(SyncError::remote(
                Some(status.as_u16()),
                format!("{reason} ({url})"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::remote(None, format!("{url}: {e}")))?;
        serde_json::from_slice(&body)
            .map_err(|e| SyncError::InvalidData(format!("undecodable response from {url}: {e}")))
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn list_versions(&self) -> Result<Vec<CorpusVersion>> {
        self.get_json(self.endpoint(&["versions"])).await
    }

    async fn list_books(&self, version: &str) -> Result<Vec<Book>> {
        require_version(version)?;
        let mut url = self.endpoint(&["books"]);
        url.query_pairs_mut().append_pair("version", version);
        self.get_json(url).await
    }

    async fn get_chapter(&self, version: &str, book: &str, chapter: u32) -> Result<Chapter> {
        validate_chapter_request(version, book, chapter)?;
        let chapter = chapter.to_string();
        self.get_json(self.endpoint(&["read", version, book, &chapter]))
            .await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        query.validate()?;
        let mut url = self.endpoint(&["read", &query.version, "search"]);
        url.query_pairs_mut()
            .append_pair("q", &query.query)
            .append_pair("take", &query.take.to_string())
            .append_pair("page", &query.page.to_string());
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> HttpSource {
        HttpSource::new(&RemoteConfig {
            base_url: base.to_string(),
            ..RemoteConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_extend_the_base_path() {
        let src = source("https://bible-api.deno.dev/api");
        assert_eq!(
            src.endpoint(&["read", "rvr", "GEN", "1"]).as_str(),
            "https://bible-api.deno.dev/api/read/rvr/GEN/1"
        );
        let trailing = source("http://localhost:8080/api/");
        assert_eq!(
            trailing.endpoint(&["versions"]).as_str(),
            "http://localhost:8080/api/versions"
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        let src = source("http://localhost/api");
        assert_eq!(
            src.endpoint(&["read", "rvr", "1/JN", "2"]).as_str(),
            "http://localhost/api/read/rvr/1%2FJN/2"
        );
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_any_network_call() {
        // Nothing listens on port 9; a request would surface as a Remote error.
        let src = source("http://127.0.0.1:9/api");
        let err = src
            .search(&SearchQuery::new("rvr", "", 10, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidRequest(_)));

        let err = src.get_chapter("rvr", "GEN", 0).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidRequest(_)));

        let err = src.list_books("").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let err = HttpSource::new(&RemoteConfig {
            base_url: "mailto:someone@example.com".into(),
            ..RemoteConfig::default()
        });
        assert!(err.is_err());
    }
}
