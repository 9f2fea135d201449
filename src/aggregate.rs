//! Fan-out over eligible sources, merge, rank, paginate.
//!
//! Sources outside the tolerance window are dropped before any network I/O.
//! Every eligible source is fetched concurrently (bounded by
//! `max_concurrency`) under its own deadline; a failed or slow source only
//! shrinks the pool, it never fails the request.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use metrics::{counter, gauge, histogram};
use tracing::info;

use crate::config::FeedConfig;
use crate::ingest::ensure_metrics_described;
use crate::ingest::fetcher::fetch_source;
use crate::ingest::types::{FeedItem, FeedTransport, FetchOutcome};
use crate::rank::{paginate, AggregatedResult, FeedQuery};
use crate::sentiment::SentimentAnalyzer;
use crate::sources::{Source, SourceRegistry};

/// Half-width of the eligibility band around the requested position.
pub const TOLERANCE: f64 = 0.6;
const TOLERANCE_EPS: f64 = 1e-9;

/// `|position - bias_filter| <= 0.6`, with the edge widened by `1e-9`.
///
/// A strict float comparison rejects pairs that sit exactly on the band in
/// decimal terms (`|0.7 - 0.1|` evaluates to `0.6000000000000001`). This
/// check accepts them, so it departs from a plain `<= 0.6` at the edge.
pub fn is_eligible(position: f64, bias_filter: f64) -> bool {
    (position - bias_filter).abs() <= TOLERANCE + TOLERANCE_EPS
}

/// Sources whose position lies within [`TOLERANCE`] of `bias_filter`, in id order.
pub fn eligible_sources(registry: &SourceRegistry, bias_filter: f64) -> Vec<Source> {
    registry
        .iter()
        .filter(|s| is_eligible(s.position, bias_filter))
        .cloned()
        .collect()
}

/// Per-run tallies, logged once per aggregation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub eligible: usize,
    pub fetched: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub items: usize,
}

pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    transport: Arc<dyn FeedTransport>,
    analyzer: Arc<SentimentAnalyzer>,
    cfg: FeedConfig,
}

impl Aggregator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        transport: Arc<dyn FeedTransport>,
        cfg: FeedConfig,
    ) -> Self {
        ensure_metrics_described();
        Self {
            registry,
            transport,
            analyzer: Arc::new(SentimentAnalyzer::new()),
            cfg,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FeedConfig {
        &self.cfg
    }

    /// Fetch every eligible source and merge items in completion order.
    pub async fn collect(&self, bias_filter: f64) -> (Vec<FeedItem>, RunStats) {
        let eligible = eligible_sources(&self.registry, bias_filter);
        let mut stats = RunStats {
            eligible: eligible.len(),
            ..Default::default()
        };

        let deadline = self.cfg.fetch_timeout();
        let transport = self.transport.as_ref();
        let analyzer = self.analyzer.as_ref();

        let outcomes: Vec<FetchOutcome> = stream::iter(eligible)
            .map(|src| async move { fetch_source(transport, analyzer, &src, deadline).await })
            .buffer_unordered(self.cfg.max_concurrency.max(1))
            .collect()
            .await;

        let mut merged = Vec::new();
        for outcome in outcomes {
            match &outcome {
                FetchOutcome::Fetched { .. } => stats.fetched += 1,
                FetchOutcome::Failed { .. } => stats.failed += 1,
                FetchOutcome::TimedOut { .. } => stats.timed_out += 1,
            }
            merged.extend(outcome.into_items());
        }
        stats.items = merged.len();
        (merged, stats)
    }

    /// Serve one feed request end to end.
    pub async fn feed(&self, query: FeedQuery) -> AggregatedResult {
        let t0 = Instant::now();
        counter!("feed_requests_total").increment(1);

        let (items, stats) = self.collect(query.bias_filter).await;
        let result = paginate(items, query.page, query.limit);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_aggregate_ms").record(ms);
        gauge!("feed_last_article_count").set(result.count as f64);
        info!(
            bias_filter = query.bias_filter,
            eligible = stats.eligible,
            fetched = stats.fetched,
            failed = stats.failed,
            timed_out = stats.timed_out,
            articles = result.count,
            page = result.page,
            limit = result.limit,
            elapsed_ms = ms as u64,
            "feed aggregated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SourceRegistry {
        SourceRegistry::from_sources([
            Source::new("far_left", "https://l.example/rss", -0.9),
            Source::new("left", "https://cl.example/rss", -0.6),
            Source::new("center", "https://c.example/rss", 0.0),
            Source::new("right", "https://cr.example/rss", 0.6),
            Source::new("far_right", "https://r.example/rss", 0.9),
            Source::new("edge", "https://e.example/rss", 0.7),
        ])
    }

    fn ids(v: &[Source]) -> Vec<&str> {
        v.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn neutral_request_excludes_outer_sources() {
        let got = eligible_sources(&registry(), 0.0);
        assert_eq!(ids(&got), ["center", "left", "right"]);
        assert!(got.iter().all(|s| s.position.abs() <= TOLERANCE));
    }

    #[test]
    fn band_edge_is_inclusive_despite_float_noise() {
        assert!(is_eligible(0.7, 0.1));
        assert!(is_eligible(-0.5, 0.1));
        assert!(!is_eligible(0.71, 0.1));
    }

    #[test]
    fn leaning_request_shifts_the_window() {
        let got = eligible_sources(&registry(), 0.8);
        assert_eq!(ids(&got), ["edge", "far_right", "right"]);
    }
}
