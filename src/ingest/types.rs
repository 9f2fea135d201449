// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// `<media:content>` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaContent {
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub medium: Option<String>,
}

/// A link on an entry: RSS `<link>` / `<enclosure>` or an Atom `<link>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLink {
    pub href: String,
    pub rel: Option<String>,
    pub mime_type: Option<String>,
}

/// RSS `<enclosure>` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    pub href: Option<String>,
    pub mime_type: Option<String>,
}

/// One syndication entry in a fixed shape, whatever dialect it came from.
/// Missing fields stay `None`/empty; nothing downstream probes raw XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// Full-content blobs (`content:encoded`, Atom `<content>`), in document order.
    pub content: Vec<String>,
    pub published: Option<String>,
    pub media_content: Vec<MediaContent>,
    /// `<media:thumbnail url=..>` values, in document order.
    pub media_thumbnails: Vec<String>,
    pub links: Vec<EntryLink>,
    pub enclosures: Vec<Enclosure>,
}

/// A scored article as served by `GET /feed`. Field names are part of the
/// public contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub source: String,
    /// Source position in `[-1, 1]`, captured at fetch time.
    pub bias: f64,
    /// Intensity in `[0, 100]`.
    pub rage_score: f64,
    /// Never empty.
    pub image_url: String,
    pub summary: String,
    /// As published by the source; not parsed.
    pub published_date: String,
}

/// Result of one fetch unit. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched { source: String, items: Vec<FeedItem> },
    Failed { source: String, reason: String },
    TimedOut { source: String },
}

impl FetchOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Fetched { source, .. } | Self::Failed { source, .. } | Self::TimedOut { source } => {
                source
            }
        }
    }

    /// Items contributed to the merge (empty unless fetched).
    pub fn into_items(self) -> Vec<FeedItem> {
        match self {
            Self::Fetched { items, .. } => items,
            _ => Vec::new(),
        }
    }
}

/// Retrieves the raw syndication document behind an endpoint.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
