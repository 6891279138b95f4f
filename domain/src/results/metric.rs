//! Sub-score metrics and their scaling onto 0..100.

use serde::{Deserialize, Serialize};

/// Upper bound of every sub-score.
pub const MAX_SUB_SCORE: f64 = 100.0;

/// A metric the scoring oracle reports per argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Clarity,
    Sentiment,
    VocabRichness,
    AvgWordLen,
    Length,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 5] = [
        Metric::Clarity,
        Metric::Sentiment,
        Metric::VocabRichness,
        Metric::AvgWordLen,
        Metric::Length,
    ];

    /// Key used in score payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Clarity => "clarity",
            Metric::Sentiment => "sentiment",
            Metric::VocabRichness => "vocab_richness",
            Metric::AvgWordLen => "avg_word_len",
            Metric::Length => "length",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Clarity => "Clarity",
            Metric::Sentiment => "Sentiment",
            Metric::VocabRichness => "Vocabulary Richness",
            Metric::AvgWordLen => "Average Word Length",
            Metric::Length => "Length",
        }
    }

    /// Scale a raw metric value onto 0..100.
    ///
    /// | Metric | Scaling |
    /// |--------|---------|
    /// | clarity | `x * 100` |
    /// | sentiment | `(x + 1) * 50` |
    /// | vocab_richness | `x * 100` |
    /// | avg_word_len | `min(x * 10, 100)` |
    /// | length | `min(x / 5, 100)` |
    ///
    /// The result is clamped to `[0, 100]`; a non-finite result becomes 0.
    pub fn scale(&self, raw: f64) -> f64 {
        let scaled = match self {
            Metric::Clarity | Metric::VocabRichness => raw * 100.0,
            Metric::Sentiment => (raw + 1.0) * 50.0,
            Metric::AvgWordLen => raw * 10.0,
            Metric::Length => raw / 5.0,
        };
        if scaled.is_finite() {
            scaled.clamp(0.0, MAX_SUB_SCORE)
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_table() {
        assert!((Metric::Clarity.scale(0.9) - 90.0).abs() < 1e-9);
        assert_eq!(Metric::Sentiment.scale(0.5), 75.0);
        assert_eq!(Metric::Sentiment.scale(-1.0), 0.0);
        assert!((Metric::VocabRichness.scale(0.7) - 70.0).abs() < 1e-9);
        assert_eq!(Metric::AvgWordLen.scale(5.0), 50.0);
        assert_eq!(Metric::Length.scale(800.0), 100.0);
        assert_eq!(Metric::Length.scale(250.0), 50.0);
    }

    #[test]
    fn test_scaling_clamps_each_sub_score() {
        assert_eq!(Metric::Clarity.scale(1.7), 100.0);
        assert_eq!(Metric::Clarity.scale(-0.3), 0.0);
        assert_eq!(Metric::Sentiment.scale(3.0), 100.0);
        assert_eq!(Metric::Sentiment.scale(-4.0), 0.0);
        assert_eq!(Metric::Length.scale(f64::INFINITY), 0.0);
    }
}
