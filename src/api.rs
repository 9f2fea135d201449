use std::collections::HashMap;
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::Aggregator;
use crate::rank::{AggregatedResult, FeedQuery};
use crate::sources::Source;

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/feed", get(feed))
        .route("/sources", get(list_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `GET /feed?bias_filter=&page=&limit=`. Bad parameters are clamped, never rejected.
async fn feed(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<AggregatedResult> {
    let query = FeedQuery::from_params(&q);
    Json(state.aggregator.feed(query).await)
}

async fn list_sources(State(state): State<AppState>) -> Json<Vec<Source>> {
    Json(state.aggregator.registry().iter().cloned().collect())
}
