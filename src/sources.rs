//! # Source Registry
//!
//! Static mapping from an outlet identifier (e.g. "npr", "foxnews") to its
//! syndication endpoint and an ideological position in `[-1.0, 1.0]`
//! (negative = left-leaning, positive = right-leaning).
//!
//! - Built-in endpoint list for the default outlets.
//! - Optional source table (JSON or TOML) sets positions and can override
//!   or add endpoints.
//! - Unknown sources resolve to position `0.0`.
//! - Built once at startup, read-only afterwards; share it as `Arc<SourceRegistry>`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One registered outlet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub id: String,
    pub endpoint: String,
    /// Ideological position; serialized as `bias` to match the feed contract.
    #[serde(rename = "bias")]
    pub position: f64,
}

impl Source {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>, position: f64) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            position: clamp_position(position),
        }
    }
}

/// Row of the source table. Extra keys in the file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Default outlets and their syndication endpoints.
pub const DEFAULT_ENDPOINTS: &[(&str, &str)] = &[
    ("breitbart", "http://feeds.feedburner.com/breitbart"),
    ("jacobin", "https://jacobin.com/feed/"),
    ("nypost", "https://nypost.com/feed/"),
    ("cnn", "http://rss.cnn.com/rss/cnn_topstories.rss"),
    ("foxnews", "http://feeds.foxnews.com/foxnews/latest"),
    ("npr", "https://feeds.npr.org/1001/rss.xml"),
    ("theguardian", "https://www.theguardian.com/world/rss"),
    ("bbc", "http://feeds.bbci.co.uk/news/rss.xml"),
    (
        "usatoday",
        "http://rssfeeds.usatoday.com/UsatodaycomNation-TopStories",
    ),
    ("federalist", "https://thefederalist.com/feed/"),
    ("democracynow", "https://www.democracynow.org/democracynow.rss"),
    ("theintercept", "https://theintercept.com/feed/?lang=en"),
    ("commondreams", "https://www.commondreams.org/rss"),
    ("dailywire", "https://www.dailywire.com/rss.xml"),
    ("newsmax", "https://www.newsmax.com/rss/Newsfront/16/"),
    ("gatewaypundit", "https://www.thegatewaypundit.com/feed/"),
];

/// Immutable registry of outlets, keyed and iterated by id.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Source>,
}

impl SourceRegistry {
    /// Registry built from an explicit list (tests, custom deployments).
    pub fn from_sources<I: IntoIterator<Item = Source>>(sources: I) -> Self {
        let sources = sources
            .into_iter()
            .map(|s| (normalize_id(&s.id), s))
            .collect();
        Self { sources }
    }

    /// Built-in outlets merged with a parsed source table.
    pub fn with_table(table: BTreeMap<String, SourceEntry>) -> Self {
        let mut sources: BTreeMap<String, Source> = DEFAULT_ENDPOINTS
            .iter()
            .map(|(id, url)| (id.to_string(), Source::new(*id, *url, 0.0)))
            .collect();

        for (raw_id, entry) in table {
            let id = normalize_id(&raw_id);
            if id.is_empty() {
                continue;
            }
            let endpoint = entry
                .endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty());
            if let Some(existing) = sources.get_mut(&id) {
                existing.position = clamp_position(entry.bias);
                if let Some(ep) = endpoint {
                    existing.endpoint = ep.to_string();
                }
                continue;
            }
            match endpoint {
                Some(ep) => {
                    sources.insert(id.clone(), Source::new(id, ep, entry.bias));
                }
                None => {
                    warn!(source = %id, "source table entry has no endpoint and no built-in feed; ignored");
                }
            }
        }

        Self { sources }
    }

    /// Built-in outlets only; every position is `0.0`.
    pub fn builtin() -> Self {
        Self::with_table(BTreeMap::new())
    }

    /// Load the source table from disk.
    ///
    /// A missing file is not an error: the registry falls back to the
    /// built-in outlets at position `0.0`. An unreadable or malformed file is
    /// logged and treated the same way.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no source table found; using built-in outlets at neutral bias");
            return Self::builtin();
        }
        match load_table(path) {
            Ok(table) => {
                let reg = Self::with_table(table);
                info!(path = %path.display(), sources = reg.len(), "source table loaded");
                reg
            }
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "source table unusable; using built-in outlets");
                Self::builtin()
            }
        }
    }

    /// Ideological position of `id`, or `0.0` when unknown.
    pub fn position(&self, id: &str) -> f64 {
        self.sources
            .get(&normalize_id(id))
            .map(|s| s.position)
            .unwrap_or(0.0)
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.get(&normalize_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Parse a source table file. Format is picked by extension, then by trial.
pub fn load_table(path: &Path) -> Result<BTreeMap<String, SourceEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source table from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_table(&content, ext.as_str())
}

fn parse_table(s: &str, hint_ext: &str) -> Result<BTreeMap<String, SourceEntry>> {
    if hint_ext == "toml" {
        return toml::from_str(s).context("parsing TOML source table");
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    if let Ok(v) = toml::from_str(s) {
        return Ok(v);
    }
    Err(anyhow!("unsupported source table format"))
}

fn normalize_id(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Clamp to `[-1.0, 1.0]`; non-finite input becomes neutral.
fn clamp_position(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
