// tests/common/mod.rs
//
// Shared helpers: a scripted transport and small registry/aggregator builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use ragefeed::{Aggregator, FeedConfig, FeedTransport, Source, SourceRegistry};

pub const RSS_SEVEN: &str = include_str!("../fixtures/rss_seven.xml");
pub const ATOM_TWO: &str = include_str!("../fixtures/atom_two.xml");

#[derive(Clone)]
pub enum Reply {
    Body(String),
    Error(String),
    /// Body delivered after a delay.
    Slow(Duration, String),
}

/// Endpoint → scripted reply. Unknown endpoints fail like a dead host.
#[derive(Default)]
pub struct StubTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &str, reply: Reply) -> Self {
        self.replies.insert(endpoint.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedTransport for StubTransport {
    async fn fetch(&self, endpoint: &str) -> Result<String> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let reply = self.replies.get(endpoint).cloned();
        let out = match reply {
            Some(Reply::Body(b)) => {
                tokio::task::yield_now().await;
                Ok(b)
            }
            Some(Reply::Slow(d, b)) => {
                tokio::time::sleep(d).await;
                Ok(b)
            }
            Some(Reply::Error(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no route to {endpoint}")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn registry(sources: &[(&str, &str, f64)]) -> Arc<SourceRegistry> {
    Arc::new(SourceRegistry::from_sources(
        sources
            .iter()
            .map(|(id, endpoint, pos)| Source::new(*id, *endpoint, *pos)),
    ))
}

pub fn config(max_concurrency: usize, fetch_timeout_secs: u64) -> FeedConfig {
    FeedConfig {
        max_concurrency,
        fetch_timeout_secs,
        ..FeedConfig::default()
    }
}

pub fn aggregator(
    sources: &[(&str, &str, f64)],
    transport: Arc<StubTransport>,
    cfg: FeedConfig,
) -> Aggregator {
    Aggregator::new(registry(sources), transport, cfg)
}

/// Minimal RSS document with `n` items titled after `tag`.
pub fn rss(tag: &str, n: usize) -> String {
    let mut items = String::new();
    for i in 0..n {
        items.push_str(&format!(
            "<item><title>{tag} story {i}</title><link>https://{tag}.example/{i}</link></item>"
        ));
    }
    format!("<rss version=\"2.0\"><channel><title>{tag}</title>{items}</channel></rss>")
}
