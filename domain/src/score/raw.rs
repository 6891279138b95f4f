//! Raw score payloads as produced by the scoring oracle.
//!
//! The oracle's output shape is not fixed. Payloads are resolved into
//! [`RawScore`] once, when they are decoded, so the rest of the crate
//! matches on a closed set of variants instead of probing JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// One entry of a multi-metric payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A plain number.
    Number(f64),
    /// A string, possibly numeric-looking.
    Text(String),
    /// An object carrying a numeric `score` field, e.g. `{score, rating}`.
    Scored { score: f64, rating: Option<String> },
    /// Anything else. Kept so the payload can be echoed back unchanged.
    Other(Value),
}

impl MetricValue {
    /// Numeric value of a number or `{score}` entry.
    ///
    /// Strings do not count here; they are only coerced for `total`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) | MetricValue::Scored { score: n, .. } if n.is_finite() => {
                Some(*n)
            }
            _ => None,
        }
    }

    /// Lenient numeric coercion: numbers, `{score}` objects and numeric strings.
    pub fn coerce(&self) -> Option<f64> {
        match self {
            MetricValue::Text(s) => parse_numeric_str(s),
            other => other.as_number(),
        }
    }
}

impl From<Value> for MetricValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(MetricValue::Number)
                .unwrap_or(MetricValue::Other(Value::Number(n))),
            Value::String(s) => MetricValue::Text(s),
            Value::Object(map) => match map.get("score").and_then(Value::as_f64) {
                Some(score) => MetricValue::Scored {
                    score,
                    rating: map.get("rating").and_then(Value::as_str).map(str::to_string),
                },
                None => MetricValue::Other(Value::Object(map)),
            },
            other => MetricValue::Other(other),
        }
    }
}

impl From<MetricValue> for Value {
    fn from(metric: MetricValue) -> Self {
        match metric {
            MetricValue::Number(n) => number_value(n),
            MetricValue::Text(s) => Value::String(s),
            MetricValue::Scored { score, rating } => {
                let mut map = Map::new();
                map.insert("score".to_string(), number_value(score));
                if let Some(rating) = rating {
                    map.insert("rating".to_string(), Value::String(rating));
                }
                Value::Object(map)
            }
            MetricValue::Other(v) => v,
        }
    }
}

/// A score payload, resolved into a tagged union at ingestion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RawScore {
    /// A JSON number.
    Numeric(f64),
    /// A JSON string. Usually numeric-looking, but not guaranteed.
    Text(String),
    /// A JSON object of named metrics.
    MultiMetric(BTreeMap<String, MetricValue>),
    /// Missing, `null`, or a shape the oracle is not known to produce.
    #[default]
    Unknown,
}

impl RawScore {
    /// Convenience constructor for multi-metric payloads built in code.
    pub fn metrics<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        RawScore::MultiMetric(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), MetricValue::Number(v)))
                .collect(),
        )
    }

    /// Whether no score has been delivered yet.
    pub fn is_unknown(&self) -> bool {
        matches!(self, RawScore::Unknown)
    }
}

impl From<Value> for RawScore {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(RawScore::Numeric).unwrap_or_default(),
            Value::String(s) => RawScore::Text(s),
            Value::Object(map) => RawScore::MultiMetric(
                map.into_iter()
                    .map(|(k, v)| (k, MetricValue::from(v)))
                    .collect(),
            ),
            _ => RawScore::Unknown,
        }
    }
}

impl From<RawScore> for Value {
    fn from(raw: RawScore) -> Self {
        match raw {
            RawScore::Numeric(n) => number_value(n),
            RawScore::Text(s) => Value::String(s),
            RawScore::MultiMetric(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
            RawScore::Unknown => Value::Null,
        }
    }
}

impl From<f64> for RawScore {
    fn from(value: f64) -> Self {
        RawScore::Numeric(value)
    }
}

impl From<&str> for RawScore {
    fn from(value: &str) -> Self {
        RawScore::Text(value.to_string())
    }
}

/// Parse a numeric-looking string into a finite number.
///
/// Surrounding whitespace is ignored. Empty strings, `NaN` and infinities
/// are rejected.
pub fn parse_numeric_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolves_shapes_at_ingestion() {
        assert_eq!(RawScore::from(json!(7.5)), RawScore::Numeric(7.5));
        assert_eq!(RawScore::from(json!("82")), RawScore::Text("82".into()));
        assert_eq!(RawScore::from(json!(null)), RawScore::Unknown);
        assert_eq!(RawScore::from(json!(true)), RawScore::Unknown);
        assert_eq!(RawScore::from(json!([1, 2])), RawScore::Unknown);

        let raw = RawScore::from(json!({
            "clarity": 0.8,
            "sentiment": {"score": 0.4, "rating": "positive"},
            "note": "n/a"
        }));
        let RawScore::MultiMetric(map) = raw else {
            panic!("expected multi-metric");
        };
        assert_eq!(map["clarity"], MetricValue::Number(0.8));
        assert_eq!(
            map["sentiment"],
            MetricValue::Scored {
                score: 0.4,
                rating: Some("positive".into())
            }
        );
        assert_eq!(map["note"], MetricValue::Text("n/a".into()));
    }

    #[test]
    fn test_metric_value_coercion() {
        assert_eq!(MetricValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(MetricValue::Text("3".into()).as_number(), None);
        assert_eq!(MetricValue::Text(" 3 ".into()).coerce(), Some(3.0));
        assert_eq!(MetricValue::Other(json!({"x": 1})).coerce(), None);
    }

    #[test]
    fn test_parse_numeric_str() {
        assert_eq!(parse_numeric_str("42"), Some(42.0));
        assert_eq!(parse_numeric_str(" -1.5e2 "), Some(-150.0));
        assert_eq!(parse_numeric_str(""), None);
        assert_eq!(parse_numeric_str("abc"), None);
        assert_eq!(parse_numeric_str("NaN"), None);
        assert_eq!(parse_numeric_str("inf"), None);
    }

    #[test]
    fn test_serializes_back_to_json() {
        let original = json!({"clarity": 0.5, "length": {"score": 300.0, "rating": "long"}});
        let raw: RawScore = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&raw).unwrap(), original);
        assert_eq!(serde_json::to_value(RawScore::Unknown).unwrap(), json!(null));
    }
}
