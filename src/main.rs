//! # bible-sync CLI (`bsync`)
//!
//! ```bash
//! bsync --config ./config/bsync.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bsync init` | Create the SQLite cache and schema |
//! | `bsync versions` | List available versions |
//! | `bsync books <version>` | List the books of a version |
//! | `bsync read <version> <book> <chapter>` | Print a chapter |
//! | `bsync search <version> "<query>"` | Search within a version |
//! | `bsync sync <version>\|all` | Mirror every chapter for offline use |
//! | `bsync verify` | Check the mirror is complete, without network access |
//! | `bsync stats` | Show what is cached |
//! | `bsync clear` | Delete every cache entry |
//!
//! Logs go to stderr and honor `RUST_LOG`; `-d`/`--debug` turns on debug output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bible_sync::progress::ProgressMode;
use bible_sync::sync_cmd::SyncArgs;
use bible_sync::{config, migrate, read, search, stats, sync_cmd, verify_cmd};
use bible_sync_core::source::SearchQuery;

/// bible-sync: mirror a remote Bible corpus into a local cache for offline reading.
#[derive(Parser)]
#[command(name = "bsync", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/bsync.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the cache database and schema.
    ///
    /// Idempotent: running it again leaves cached entries untouched.
    Init,

    /// List the versions the API offers.
    Versions {
        /// Refetch even when cached.
        #[arg(long)]
        refresh: bool,
    },

    /// List the books of a version.
    Books {
        version: String,
        #[arg(long)]
        refresh: bool,
    },

    /// Print one chapter, from the cache when possible.
    Read {
        version: String,
        /// Book abbreviation as listed by `bsync books` (e.g. `GEN`).
        book: String,
        chapter: u32,
        #[arg(long)]
        refresh: bool,
        /// Print the raw chapter JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search the text of a version.
    Search {
        version: String,
        query: String,
        /// Results per page.
        #[arg(long, default_value_t = 10)]
        take: u32,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        refresh: bool,
        #[arg(long)]
        json: bool,
    },

    /// Mirror every chapter of a version (or `all` versions).
    ///
    /// Chapters already cached are skipped, so an interrupted sync resumes
    /// where it stopped.
    Sync {
        /// Version id, or `all`.
        target: String,

        /// Refetch everything, ignoring the cache.
        #[arg(long)]
        refresh: bool,

        /// Delete every cache entry before starting.
        #[arg(long)]
        clear: bool,

        /// Continue with later books after a chapter fails.
        #[arg(long)]
        keep_going: bool,

        /// Chapter downloads in flight (default from `sync.concurrency`).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Check that every chapter is cached, without network access.
    ///
    /// Exits with status 1 when something is missing.
    Verify {
        /// Only check this version. Default: every cached version.
        #[arg(long)]
        version: Option<String>,

        /// List every missing entry instead of stopping at the first.
        #[arg(long)]
        verbose: bool,
    },

    /// Show cache statistics.
    Stats,

    /// Delete every cache entry.
    Clear,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "bible_sync=debug,bible_sync_core=debug"
    } else {
        "bible_sync=info,bible_sync_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Cache initialized at {}.", cfg.db.path.display());
        }
        Commands::Versions { refresh } => {
            read::run_versions(&cfg, refresh).await?;
        }
        Commands::Books { version, refresh } => {
            read::run_books(&cfg, &version, refresh).await?;
        }
        Commands::Read {
            version,
            book,
            chapter,
            refresh,
            json,
        } => {
            read::run_read(&cfg, &version, &book, chapter, refresh, json).await?;
        }
        Commands::Search {
            version,
            query,
            take,
            page,
            refresh,
            json,
        } => {
            let query = SearchQuery::new(version, query, take, page);
            search::run_search(&cfg, query, refresh, json).await?;
        }
        Commands::Sync {
            target,
            refresh,
            clear,
            keep_going,
            concurrency,
            progress,
        } => {
            let args = SyncArgs {
                refresh,
                clear,
                keep_going,
                concurrency,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            sync_cmd::run_sync(&cfg, &target, &args).await?;
        }
        Commands::Verify { version, verbose } => {
            if !verify_cmd::run_verify(&cfg, version, verbose).await? {
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Clear => {
            stats::run_clear(&cfg).await?;
        }
    }

    Ok(())
}
