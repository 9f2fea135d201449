//! Rage score: emotional hostility of a headline on a `0..=100` scale.
//!
//! score = (neg * 0.6 + |compound| * 0.4) * 100, rounded to one decimal.
//! Raw negativity outweighs net polarity, so hostile headlines rank above
//! merely emotional ones.

use crate::sentiment::SentimentAnalyzer;

pub const NEG_WEIGHT: f64 = 0.6;
pub const COMPOUND_WEIGHT: f64 = 0.4;
pub const MAX_RAGE: f64 = 100.0;

/// Intensity score for `text` in `[0, 100]`, one decimal place.
pub fn rage_score(analyzer: &SentimentAnalyzer, text: &str) -> f64 {
    let s = analyzer.polarity_scores(text);
    let raw = (s.neg * NEG_WEIGHT + s.compound.abs() * COMPOUND_WEIGHT) * MAX_RAGE;
    if !raw.is_finite() {
        return 0.0;
    }
    round1(raw.clamp(0.0, MAX_RAGE))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
