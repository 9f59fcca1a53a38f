//! `bsync search`: paginated text search within one version.
//!
//! Result pages are cached per (version, query, take, page), so repeating a
//! search works offline.

use anyhow::Result;

use bible_sync_core::models::SearchPage;
use bible_sync_core::source::SearchQuery;

use crate::config::Config;
use crate::mirror::Mirror;

pub async fn run_search(
    config: &Config,
    query: SearchQuery,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let mirror = Mirror::open(config).await?;
    let result = mirror
        .fetcher
        .search(&query, &mirror.fetch_options(refresh))
        .await;
    mirror.report_storage_fault();
    mirror.close().await;

    let page = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    print!("{}", render_page(&query, &page));
    Ok(())
}

fn render_page(query: &SearchQuery, page: &SearchPage) -> String {
    let mut out = String::new();
    if page.hits.is_empty() {
        out.push_str(&format!("No results for \"{}\" in {}.\n", query.query, query.version));
        return out;
    }
    for (i, hit) in page.hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} {}:{}  {}\n",
            i + 1,
            hit.book,
            hit.chapter,
            hit.number,
            hit.text
        ));
    }
    let total_pages = page
        .pagination
        .as_ref()
        .map(|p| p.total_pages.to_string())
        .unwrap_or_else(|| "?".to_string());
    out.push_str(&format!(
        "\npage {} of {}, {} results\n",
        page.page, total_pages, page.total
    ));
    out
}
