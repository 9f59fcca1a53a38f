//! Cache-first reads: `bsync versions`, `bsync books`, `bsync read`.
//!
//! Each command serves from the local cache when it can and falls back to
//! the remote API, writing the result through for next time.

use anyhow::Result;

use bible_sync_core::models::{Book, Chapter, CorpusVersion, Testament};

use crate::config::Config;
use crate::mirror::Mirror;

pub async fn run_versions(config: &Config, refresh: bool) -> Result<()> {
    let mirror = Mirror::open(config).await?;
    let versions = mirror
        .fetcher
        .fetch_versions(&mirror.fetch_options(refresh))
        .await;
    mirror.report_storage_fault();
    mirror.close().await;

    print_versions(&versions?);
    Ok(())
}

fn print_versions(versions: &[CorpusVersion]) {
    println!("{:<12} {}", "VERSION", "NAME");
    println!("{}", "-".repeat(60));
    for v in versions {
        println!("{:<12} {}", v.id, v.name);
    }
    println!();
    println!("{} versions", versions.len());
}

pub async fn run_books(config: &Config, version: &str, refresh: bool) -> Result<()> {
    let mirror = Mirror::open(config).await?;
    let books = mirror
        .fetcher
        .fetch_books(version, &mirror.fetch_options(refresh))
        .await;
    mirror.report_storage_fault();
    mirror.close().await;

    let books = books?;
    print_books(version, &books);
    Ok(())
}

fn print_books(version: &str, books: &[Book]) {
    println!("{:<8} {:<28} {:>8}  {}", "ABBREV", "NAME", "CHAPTERS", "TESTAMENT");
    println!("{}", "-".repeat(60));
    for b in books {
        let testament = match b.testament {
            Testament::Old => "old",
            Testament::New => "new",
        };
        println!(
            "{:<8} {:<28} {:>8}  {}",
            b.abbreviation,
            b.display_name(),
            b.chapters,
            testament
        );
    }
    println!();
    let chapters: u64 = books.iter().map(|b| b.chapters as u64).sum();
    println!("{}: {} books, {} chapters", version, books.len(), chapters);
}

pub async fn run_read(
    config: &Config,
    version: &str,
    book: &str,
    chapter: u32,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let mirror = Mirror::open(config).await?;
    let result = mirror
        .fetcher
        .fetch_chapter(version, book, chapter, &mirror.fetch_options(refresh))
        .await;
    mirror.report_storage_fault();
    mirror.close().await;

    let chapter = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&chapter)?);
    } else {
        print!("{}", render_chapter(version, &chapter));
    }
    Ok(())
}

fn render_chapter(version: &str, chapter: &Chapter) -> String {
    let mut out = format!(
        "--- {} {} ({}) ---\n",
        chapter.book_name, chapter.chapter, version
    );
    for verse in &chapter.verses {
        out.push_str(&format!("{:>3}  {}\n", verse.number, verse.text));
        if let Some(study) = &verse.study {
            out.push_str(&format!("     [{}]\n", study));
        }
    }
    out
}
