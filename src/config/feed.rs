// src/config/feed.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_FEED_CONFIG_PATH: &str = "config/feed.toml";
pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_MAX_CONCURRENCY: &str = "FEED_MAX_CONCURRENCY";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FEED_FETCH_TIMEOUT_SECS";
pub const ENV_SOURCES_PATH: &str = "FEED_SOURCES_PATH";
pub const ENV_USER_AGENT: &str = "FEED_USER_AGENT";

const MAX_CONCURRENCY_CEILING: usize = 256;
const MAX_TIMEOUT_SECS: u64 = 300;

fn default_max_concurrency() -> usize {
    20
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_sources_path() -> PathBuf {
    PathBuf::from("sources.json")
}
fn default_user_agent() -> String {
    format!("ragefeed/{}", env!("CARGO_PKG_VERSION"))
}

/// Service configuration for the aggregation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Upper bound on fetch units running at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-source deadline; a slower source contributes nothing.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Source table (JSON or TOML) with per-outlet bias and endpoint overrides.
    #[serde(default = "default_sources_path")]
    pub sources_path: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            sources_path: default_sources_path(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedConfig {
    /// Load from an explicit TOML file, then sanitize. Env overrides are not applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let cfg: FeedConfig = toml::from_str(&data)
            .with_context(|| format!("parsing feed config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolve the config the same way the binary does:
    /// 1) $FEED_CONFIG_PATH (must exist)
    /// 2) config/feed.toml if present
    /// 3) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn from_env() -> Result<Self> {
        let base = match env::var(ENV_FEED_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_FEED_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(base.with_env_overrides().sanitized())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(n) = parse_env::<usize>(ENV_MAX_CONCURRENCY) {
            self.max_concurrency = n;
        }
        if let Some(n) = parse_env::<u64>(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch_timeout_secs = n;
        }
        if let Ok(p) = env::var(ENV_SOURCES_PATH) {
            if !p.trim().is_empty() {
                self.sources_path = PathBuf::from(p.trim());
            }
        }
        if let Ok(ua) = env::var(ENV_USER_AGENT) {
            if !ua.trim().is_empty() {
                self.user_agent = ua.trim().to_string();
            }
        }
        self
    }

    fn sanitized(mut self) -> Self {
        self.max_concurrency = self.max_concurrency.clamp(1, MAX_CONCURRENCY_CEILING);
        self.fetch_timeout_secs = self.fetch_timeout_secs.clamp(1, MAX_TIMEOUT_SECS);
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        self
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}
