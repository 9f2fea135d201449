//! Global ordering and page slicing of merged feed items.

use serde::Serialize;
use std::collections::HashMap;

use crate::ingest::types::FeedItem;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Validated request parameters. Construction never fails: out-of-range
/// values are clamped so every request gets a best-effort page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedQuery {
    pub bias_filter: f64,
    pub page: usize,
    pub limit: usize,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            bias_filter: 0.0,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FeedQuery {
    pub fn new(bias_filter: f64, page: i64, limit: i64) -> Self {
        let bias_filter = if bias_filter.is_finite() {
            bias_filter.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            bias_filter,
            page: page.max(1) as usize,
            limit: limit.max(1) as usize,
        }
    }

    /// Lenient parse of raw query pairs; missing or garbled values fall back
    /// to their defaults.
    pub fn from_params(q: &HashMap<String, String>) -> Self {
        let d = Self::default();
        let bias = q
            .get("bias_filter")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(d.bias_filter);
        let page = q
            .get("page")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(d.page as i64);
        let limit = q
            .get("limit")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(d.limit as i64);
        Self::new(bias, page, limit)
    }
}

/// One page of ranked articles plus the pre-pagination total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    pub count: usize,
    pub page: usize,
    pub limit: usize,
    pub articles: Vec<FeedItem>,
}

/// Sort by `rage_score` descending. Stable: equal scores keep arrival order.
pub fn rank(items: &mut [FeedItem]) {
    items.sort_by(|a, b| b.rage_score.total_cmp(&a.rage_score));
}

/// Rank `items` and cut out page `page` of size `limit` (both ≥ 1).
pub fn paginate(mut items: Vec<FeedItem>, page: usize, limit: usize) -> AggregatedResult {
    let page = page.max(1);
    let limit = limit.max(1);
    rank(&mut items);

    let count = items.len();
    let start = (page - 1).saturating_mul(limit).min(count);
    let end = start.saturating_add(limit).min(count);
    let articles = items.drain(start..end).collect();

    AggregatedResult {
        count,
        page,
        limit,
        articles,
    }
}
