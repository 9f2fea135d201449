// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod rank;
pub mod scoring;
pub mod sentiment;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::Aggregator;
pub use crate::api::{create_router, AppState};
pub use crate::config::FeedConfig;
pub use crate::ingest::types::{FeedItem, FeedTransport, FetchOutcome};
pub use crate::rank::{AggregatedResult, FeedQuery};
pub use crate::sources::{Source, SourceRegistry};

use std::sync::Arc;

use shuttle_axum::axum::Router;
use tracing::info;

use crate::ingest::fetcher::HttpTransport;
use crate::metrics::Metrics;

/// `EnvFilter` directives used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "ragefeed=info,warn";

/// Build the aggregator the binaries run: config from env/files, the source
/// table from `cfg.sources_path`, and an HTTP transport.
pub fn build_aggregator(cfg: FeedConfig) -> anyhow::Result<Aggregator> {
    let registry = SourceRegistry::load_from_file(&cfg.sources_path);
    let transport = HttpTransport::new(cfg.fetch_timeout(), &cfg.user_agent)?;
    info!(
        sources = registry.len(),
        max_concurrency = cfg.max_concurrency,
        fetch_timeout_secs = cfg.fetch_timeout_secs,
        "aggregator ready"
    );
    Ok(Aggregator::new(Arc::new(registry), Arc::new(transport), cfg))
}

/// Full service router: API routes plus `/metrics` when a recorder is installed.
pub fn app(aggregator: Aggregator) -> Router {
    let router = create_router(AppState::new(Arc::new(aggregator)));
    match Metrics::init() {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}
