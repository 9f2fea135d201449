// src/ingest/fetcher.rs
//! One fetch unit: download a source's document, parse it, keep the first
//! few entries and turn them into scored [`FeedItem`]s.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::ingest::image::resolve_image;
use crate::ingest::parser::parse_feed;
use crate::ingest::truncate_summary;
use crate::ingest::types::{FeedItem, FeedTransport, FetchOutcome, RawEntry};
use crate::scoring::rage_score;
use crate::sentiment::SentimentAnalyzer;
use crate::sources::Source;

/// Entries taken from the head of each feed.
pub const MAX_ITEMS_PER_SOURCE: usize = 5;

/// Largest feed document accepted from one source.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    max_body: usize,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            max_body: MAX_BODY_BYTES,
        })
    }

    /// Override the body cap (bytes, at least 1).
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body.max(1);
        self
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn fetch(&self, endpoint: &str) -> Result<String> {
        let mut resp = self
            .client
            .get(endpoint)
            .send()
            .await
            .context("feed http get()")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("feed fetch failed with status: {}", status));
        }
        if let Some(len) = resp.content_length() {
            if len > self.max_body as u64 {
                return Err(anyhow!(
                    "feed body too large: {len} bytes (limit {})",
                    self.max_body
                ));
            }
        }

        // Content-Length can be absent or wrong; count what actually arrives.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await.context("feed http body")? {
            if body.len() + chunk.len() > self.max_body {
                return Err(anyhow!(
                    "feed body too large: over {} bytes",
                    self.max_body
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Turn one parsed entry into a [`FeedItem`] for `source`.
pub fn build_item(analyzer: &SentimentAnalyzer, source: &Source, entry: &RawEntry) -> FeedItem {
    let title = entry.title.clone().unwrap_or_default();
    FeedItem {
        rage_score: rage_score(analyzer, &title),
        image_url: resolve_image(entry),
        link: entry.link.clone().unwrap_or_default(),
        source: source.id.clone(),
        bias: source.position,
        summary: truncate_summary(entry.summary.as_deref().unwrap_or_default()),
        published_date: entry.published.clone().unwrap_or_default(),
        title,
    }
}

/// Parse a document and build at most [`MAX_ITEMS_PER_SOURCE`] items.
pub fn items_from_document(
    analyzer: &SentimentAnalyzer,
    source: &Source,
    body: &str,
) -> Result<Vec<FeedItem>> {
    let entries = parse_feed(body).with_context(|| format!("parsing feed for {}", source.id))?;
    Ok(entries
        .iter()
        .take(MAX_ITEMS_PER_SOURCE)
        .map(|e| build_item(analyzer, source, e))
        .collect())
}

/// Run one fetch unit under `deadline`. Never fails: errors and timeouts
/// come back as [`FetchOutcome`] variants.
pub async fn fetch_source(
    transport: &dyn FeedTransport,
    analyzer: &SentimentAnalyzer,
    source: &Source,
    deadline: Duration,
) -> FetchOutcome {
    let t0 = Instant::now();
    counter!("feed_source_fetches_total").increment(1);

    let body = match tokio::time::timeout(deadline, transport.fetch(&source.endpoint)).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            warn!(error = ?e, source = %source.id, transport = transport.name(), "source fetch failed");
            counter!("feed_source_errors_total").increment(1);
            return FetchOutcome::Failed {
                source: source.id.clone(),
                reason: format!("{e:#}"),
            };
        }
        Err(_) => {
            warn!(source = %source.id, deadline_ms = deadline.as_millis() as u64, "source fetch timed out");
            counter!("feed_source_timeouts_total").increment(1);
            return FetchOutcome::TimedOut {
                source: source.id.clone(),
            };
        }
    };

    let outcome = match items_from_document(analyzer, source, &body) {
        Ok(items) => {
            counter!("feed_items_fetched_total").increment(items.len() as u64);
            debug!(source = %source.id, items = items.len(), "source parsed");
            FetchOutcome::Fetched {
                source: source.id.clone(),
                items,
            }
        }
        Err(e) => {
            warn!(error = ?e, source = %source.id, "source document unusable");
            counter!("feed_source_errors_total").increment(1);
            FetchOutcome::Failed {
                source: source.id.clone(),
                reason: format!("{e:#}"),
            }
        }
    };

    histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss_with(n: usize) -> String {
        let mut items = String::new();
        for i in 0..n {
            items.push_str(&format!(
                "<item><title>Story {i} sparks outrage</title><link>https://s.example/{i}</link><description>Body {i}</description></item>"
            ));
        }
        format!("<rss version=\"2.0\"><channel><title>S</title>{items}</channel></rss>")
    }

    struct Fixed(String);

    #[async_trait]
    impl FeedTransport for Fixed {
        async fn fetch(&self, _endpoint: &str) -> Result<String> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Broken;

    #[async_trait]
    impl FeedTransport for Broken {
        async fn fetch(&self, endpoint: &str) -> Result<String> {
            Err(anyhow!("connection refused: {endpoint}"))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    struct Slow;

    #[async_trait]
    impl FeedTransport for Slow {
        async fn fetch(&self, _endpoint: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn src(position: f64) -> Source {
        Source::new("s", "https://s.example/rss", position)
    }

    #[test]
    fn caps_items_per_source() {
        let a = SentimentAnalyzer::new();
        let items = items_from_document(&a, &src(0.2), &rss_with(9)).unwrap();
        assert_eq!(items.len(), MAX_ITEMS_PER_SOURCE);
        // head of the feed, in document order
        assert_eq!(items[0].link, "https://s.example/0");
        assert_eq!(items[4].link, "https://s.example/4");
    }

    #[test]
    fn item_carries_source_position_and_formatted_fields() {
        let a = SentimentAnalyzer::new();
        let items = items_from_document(&a, &src(-0.4), &rss_with(1)).unwrap();
        let it = &items[0];
        assert_eq!(it.source, "s");
        assert_eq!(it.bias, -0.4);
        assert_eq!(it.summary, "Body 0...");
        assert_eq!(it.published_date, "");
        assert!(!it.image_url.is_empty());
        assert!((0.0..=100.0).contains(&it.rage_score));
        assert!(it.rage_score > 0.0);
    }

    #[tokio::test]
    async fn transport_error_becomes_failed_outcome() {
        let a = SentimentAnalyzer::new();
        let out = fetch_source(&Broken, &a, &src(0.0), Duration::from_secs(5)).await;
        match out {
            FetchOutcome::Failed { source, reason } => {
                assert_eq!(source, "s");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_document_contributes_nothing() {
        let a = SentimentAnalyzer::new();
        let out = fetch_source(
            &Fixed("<html>not a feed</html>".into()),
            &a,
            &src(0.0),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(out, FetchOutcome::Failed { .. }));
        assert!(out.into_items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let a = SentimentAnalyzer::new();
        let out = fetch_source(&Slow, &a, &src(0.0), Duration::from_secs(2)).await;
        assert_eq!(
            out,
            FetchOutcome::TimedOut {
                source: "s".into()
            }
        );
    }

    #[tokio::test]
    async fn good_document_is_fetched() {
        let a = SentimentAnalyzer::new();
        let out = fetch_source(&Fixed(rss_with(3)), &a, &src(0.0), Duration::from_secs(5)).await;
        assert_eq!(out.source(), "s");
        assert_eq!(out.into_items().len(), 3);
    }
}
