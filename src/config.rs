use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use bible_sync_core::sync::DEFAULT_CONCURRENCY;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://bible-api.deno.dev/api".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("bsync/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Cached entries older than this are refetched. Unset means never.
    #[serde(default)]
    pub ttl_hours: Option<u64>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default)]
    pub keep_going: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            ttl_hours: None,
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
            keep_going: false,
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_backoff_secs() -> u64 {
    2
}

impl Config {
    /// Defaults with the database at `db_path`.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            remote: RemoteConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    let base = &config.remote.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("remote.base_url must be an http(s) URL, got '{}'", base);
    }
    reqwest::Url::parse(base).with_context(|| format!("remote.base_url is not a valid URL: {}", base))?;

    if config.remote.timeout_secs == 0 {
        anyhow::bail!("remote.timeout_secs must be > 0");
    }

    if config.sync.concurrency == 0 {
        anyhow::bail!("sync.concurrency must be >= 1");
    }
    if config.sync.max_attempts == 0 {
        anyhow::bail!("sync.max_attempts must be >= 1");
    }
    if config.sync.ttl_hours == Some(0) {
        anyhow::bail!("sync.ttl_hours must be > 0 when set");
    }

    Ok(())
}
