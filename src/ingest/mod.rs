// src/ingest/mod.rs
pub mod fetcher;
pub mod image;
pub mod parser;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// Characters kept from an entry summary before the ellipsis.
pub const SUMMARY_CHARS: usize = 150;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_series);
}

/// HELP text for every feed series. Descriptions go to whichever recorder is
/// installed at call time.
pub fn describe_series() {
    describe_counter!("feed_requests_total", "GET /feed requests served.");
    describe_counter!("feed_source_fetches_total", "Source fetches started.");
    describe_counter!(
        "feed_source_errors_total",
        "Source fetches that failed on transport or parse."
    );
    describe_counter!(
        "feed_source_timeouts_total",
        "Source fetches cut off by the per-source deadline."
    );
    describe_counter!("feed_items_fetched_total", "Items built from fetched sources.");
    describe_histogram!("feed_fetch_ms", "Per-source fetch + parse time in milliseconds.");
    describe_histogram!("feed_aggregate_ms", "Whole aggregation time in milliseconds.");
    describe_gauge!(
        "feed_last_article_count",
        "Articles merged by the most recent aggregation."
    );
}

/// First [`SUMMARY_CHARS`] characters of `s` followed by `...`. The
/// ellipsis is appended even when nothing was cut.
pub fn truncate_summary(s: &str) -> String {
    let mut out: String = s.chars().take(SUMMARY_CHARS).collect();
    out.push_str("...");
    out
}
