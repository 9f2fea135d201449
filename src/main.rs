//! Rage feed service: binary entrypoint.
//! Boots the Axum HTTP server with the aggregation pipeline behind `/feed`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ragefeed::{app, build_aggregator, FeedConfig, DEFAULT_LOG_FILTER};

/// Compact logs by default, JSON lines when `FEED_LOG_JSON=1`.
/// `RUST_LOG` wins over the built-in filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("FEED_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    // The shuttle runtime may already own the global subscriber.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = FeedConfig::from_env()?;
    let aggregator = build_aggregator(cfg)?;

    Ok(app(aggregator).into())
}
