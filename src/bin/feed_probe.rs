//! One-shot aggregation from the command line; prints the page as JSON.
//!
//! Usage: `feed_probe [bias_filter] [page] [limit]`

use ragefeed::{build_aggregator, FeedConfig, FeedQuery, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize| args.get(i).and_then(|s| s.parse::<f64>().ok());
    let d = FeedQuery::default();
    let query = FeedQuery::new(
        arg(0).unwrap_or(d.bias_filter),
        arg(1).map(|v| v as i64).unwrap_or(d.page as i64),
        arg(2).map(|v| v as i64).unwrap_or(d.limit as i64),
    );

    let aggregator = build_aggregator(FeedConfig::from_env()?)?;
    let result = aggregator.feed(query).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
