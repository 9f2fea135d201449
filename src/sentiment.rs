//! VADER sentiment analysis.
//!
//! Produces normalized polarity proportions (`neg`, `neu`, `pos`) and a
//! `compound` polarity in `[-1, 1]`, using the complete VADER lexicon and
//! rule set (boosters, caps emphasis, negation, contrastive "but",
//! punctuation emphasis, idioms, emoji).

use serde::Serialize;

/// Output of [`SentimentAnalyzer::polarity_scores`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// Stateless handle; the lexicon lives in process-wide statics, so one
/// analyzer can be read from any number of tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        // Force lexicon parsing at construction rather than on the first request.
        let _ = vader_sentiment::SentimentIntensityAnalyzer::new().polarity_scores("warm up");
        Self
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        if text.trim().is_empty() {
            return PolarityScores::default();
        }
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        let raw = analyzer.polarity_scores(text);
        let field = |k: &str| {
            raw.get(k)
                .copied()
                .filter(|v: &f64| v.is_finite())
                .unwrap_or(0.0)
        };
        PolarityScores {
            neg: field("neg"),
            neu: field("neu"),
            pos: field("pos"),
            compound: field("compound").clamp(-1.0, 1.0),
        }
    }
}
