// src/ingest/image.rs
//! Best-effort representative image for an entry.
//!
//! Resolution order, first hit wins:
//! 1. `media:content` declared as an image (type or medium)
//! 2. first `media:thumbnail`
//! 3. any link typed `image/*` or with `rel="enclosure"`
//! 4. any enclosure typed `image/*`
//! 5. first `<img src="http...">` in summary + content HTML
//! 6. placeholder seeded by a hash of the title (always succeeds)

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::ingest::types::RawEntry;

pub const PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";
const PLACEHOLDER_SIZE: &str = "600/400";

static RE_IMG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["'](http[^"']+)["']"#).expect("img regex")
});

/// Image URL for `entry`; never empty.
pub fn resolve_image(entry: &RawEntry) -> String {
    from_media_content(entry)
        .or_else(|| from_thumbnail(entry))
        .or_else(|| from_links(entry))
        .or_else(|| from_enclosures(entry))
        .or_else(|| from_html(entry))
        .unwrap_or_else(|| placeholder_for(entry.title.as_deref().unwrap_or_default()))
}

fn from_media_content(entry: &RawEntry) -> Option<String> {
    entry
        .media_content
        .iter()
        .filter(|m| {
            m.mime_type.as_deref().is_some_and(|t| t.contains("image"))
                || m.medium.as_deref() == Some("image")
        })
        .find_map(|m| m.url.clone())
}

fn from_thumbnail(entry: &RawEntry) -> Option<String> {
    entry.media_thumbnails.first().cloned()
}

fn from_links(entry: &RawEntry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| {
            l.mime_type.as_deref().is_some_and(|t| t.starts_with("image/"))
                || l.rel.as_deref() == Some("enclosure")
        })
        .map(|l| l.href.clone())
}

fn from_enclosures(entry: &RawEntry) -> Option<String> {
    entry
        .enclosures
        .iter()
        .filter(|e| e.mime_type.as_deref().is_some_and(|t| t.starts_with("image/")))
        .find_map(|e| e.href.clone())
}

fn from_html(entry: &RawEntry) -> Option<String> {
    let mut corpus = entry.summary.clone().unwrap_or_default();
    for blob in &entry.content {
        corpus.push_str(blob);
    }
    RE_IMG
        .captures(&corpus)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Deterministic placeholder: same title, same URL, in any process.
pub fn placeholder_for(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let mut seed = String::with_capacity(32);
    for b in digest.iter().take(16) {
        let _ = write!(&mut seed, "{:02x}", b);
    }
    format!("{PLACEHOLDER_BASE}/{seed}/{PLACEHOLDER_SIZE}")
}
