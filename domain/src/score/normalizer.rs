//! Score normalization.
//!
//! Turns any [`RawScore`] into a [`NormalizedScore`]: a single canonical
//! value plus the numeric metric breakdown it was derived from.
//!
//! # Resolution order
//!
//! | Payload | Canonical value | Source kind |
//! |---------|-----------------|-------------|
//! | finite number | the number | `numeric` |
//! | numeric string | the parsed number | `numeric-string` |
//! | object with `total` | numeric coercion of `total` (0.0 if it fails) | `multi-metric` |
//! | object without `total` | mean of its number / `{score}` entries | `multi-metric` |
//! | anything else | 0.0 | `unknown` |
//!
//! Normalization is total: it never panics and never yields NaN.

use super::raw::{MetricValue, RawScore, parse_numeric_str};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the metric that overrides the mean when present.
pub const TOTAL_METRIC: &str = "total";

/// Which payload shape produced a normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Numeric,
    NumericString,
    MultiMetric,
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Numeric => "numeric",
            SourceKind::NumericString => "numeric-string",
            SourceKind::MultiMetric => "multi-metric",
            SourceKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A score reduced to a canonical value (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedScore {
    /// Full precision; round only for display.
    pub canonical_value: f64,
    /// Numeric metrics found in a multi-metric payload.
    pub metrics: BTreeMap<String, f64>,
    pub source_kind: SourceKind,
}

impl NormalizedScore {
    fn unknown() -> Self {
        Self {
            canonical_value: 0.0,
            metrics: BTreeMap::new(),
            source_kind: SourceKind::Unknown,
        }
    }

    fn scalar(value: f64, source_kind: SourceKind) -> Self {
        Self {
            canonical_value: value,
            metrics: BTreeMap::new(),
            source_kind,
        }
    }

    /// Look up one metric of the breakdown.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Canonical value rounded to two decimals for display.
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.canonical_value)
    }
}

/// Normalize a raw score payload.
///
/// # Examples
///
/// ```
/// use debate_domain::score::{RawScore, SourceKind, normalize};
///
/// let score = normalize(&RawScore::metrics([("clarity", 0.8), ("sentiment", 0.6)]));
/// assert!((score.canonical_value - 0.7).abs() < 1e-9);
/// assert_eq!(score.source_kind, SourceKind::MultiMetric);
///
/// let score = normalize(&RawScore::Text("abc".into()));
/// assert_eq!(score.canonical_value, 0.0);
/// assert_eq!(score.source_kind, SourceKind::Unknown);
/// ```
pub fn normalize(raw: &RawScore) -> NormalizedScore {
    match raw {
        RawScore::Numeric(n) if n.is_finite() => {
            NormalizedScore::scalar(*n, SourceKind::Numeric)
        }
        RawScore::Text(s) => match parse_numeric_str(s) {
            Some(n) => NormalizedScore::scalar(n, SourceKind::NumericString),
            None => NormalizedScore::unknown(),
        },
        RawScore::MultiMetric(entries) => normalize_metrics(entries),
        _ => NormalizedScore::unknown(),
    }
}

fn normalize_metrics(entries: &BTreeMap<String, MetricValue>) -> NormalizedScore {
    let metrics: BTreeMap<String, f64> = entries
        .iter()
        .filter_map(|(name, value)| {
            let number = if name == TOTAL_METRIC {
                value.coerce()
            } else {
                value.as_number()
            };
            number.map(|n| (name.clone(), n))
        })
        .collect();

    if let Some(total) = entries.get(TOTAL_METRIC) {
        return NormalizedScore {
            canonical_value: total.coerce().unwrap_or(0.0),
            metrics,
            source_kind: SourceKind::MultiMetric,
        };
    }

    if metrics.is_empty() {
        return NormalizedScore::unknown();
    }

    let mean = metrics.values().sum::<f64>() / metrics.len() as f64;
    NormalizedScore {
        // Large finite inputs can still overflow the sum.
        canonical_value: if mean.is_finite() { mean } else { 0.0 },
        metrics,
        source_kind: SourceKind::MultiMetric,
    }
}
