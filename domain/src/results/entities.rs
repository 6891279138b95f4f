//! Results of a finalized debate.

use super::metric::Metric;
use crate::score::MetricValue;
use crate::session::value_objects::Side;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// How equal totals are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Equal totals produce [`Outcome::Draw`].
    #[default]
    Draw,
    /// Equal totals go to side A, the session creator.
    FirstSide,
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draw" => Ok(TieBreak::Draw),
            "first-side" | "first_side" => Ok(TieBreak::FirstSide),
            other => Err(format!(
                "unknown tie-break '{}', expected draw or first-side",
                other
            )),
        }
    }
}

/// Outcome of a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

impl Outcome {
    /// Decide the outcome from two totals. Only a strictly greater total wins.
    pub fn decide(total_a: f64, total_b: f64, tie_break: TieBreak) -> Self {
        if total_a > total_b {
            Outcome::Winner(Side::A)
        } else if total_b > total_a {
            Outcome::Winner(Side::B)
        } else {
            match tie_break {
                TieBreak::Draw => Outcome::Draw,
                TieBreak::FirstSide => Outcome::Winner(Side::A),
            }
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Winner(side) => Some(*side),
            Outcome::Draw => None,
        }
    }

    fn from_wire(winner: &str) -> Option<Self> {
        match winner.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Outcome::Winner(Side::A)),
            "b" => Some(Outcome::Winner(Side::B)),
            "draw" | "tie" => Some(Outcome::Draw),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(side) => write!(f, "{}", side),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Where a [`Results`] value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsSource {
    /// Reported by the server.
    #[default]
    Server,
    /// Computed by the client from the arguments it holds.
    Local,
}

/// A score with the oracle's qualitative rating, e.g. `{score: 0.82, rating: "good"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedScore {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

impl RatedScore {
    fn from_wire(value: Value) -> Option<Self> {
        match MetricValue::from(value) {
            MetricValue::Scored { score, rating } if score.is_finite() => {
                Some(Self { score, rating })
            }
            other => other.coerce().map(|score| Self {
                score,
                rating: None,
            }),
        }
    }
}

/// Per-side totals and the winner (Value Object)
///
/// Decodes the server's `{winner, users, totals, scores, coherence}` shape,
/// where each total or metric may be a number or a `{score, rating}` object.
///
/// `breakdown` holds metric values on the oracle's own scale (clarity in
/// 0..1, sentiment in -1..1, ...) whether the results came from the server
/// or were computed locally; [`Results::scaled_sub_score`] maps them onto
/// 0..100. Totals are always on the 0..100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResultsRecord", into = "ResultsRecord")]
pub struct Results {
    pub outcome: Outcome,
    pub totals: BTreeMap<Side, f64>,
    /// Raw metric means per side, keyed by metric name.
    pub breakdown: BTreeMap<Side, BTreeMap<String, f64>>,
    /// Display name of each side's participant, when known.
    pub side_names: BTreeMap<Side, String>,
    pub coherence: Option<RatedScore>,
    pub source: ResultsSource,
    /// Arguments left out because their author holds no side.
    pub unassigned_arguments: usize,
}

impl Results {
    pub fn winner_side(&self) -> Option<Side> {
        self.outcome.winner()
    }

    /// Total for a side, 0.0 when the side is absent.
    pub fn total(&self, side: Side) -> f64 {
        self.totals.get(&side).copied().unwrap_or(0.0)
    }

    /// Raw metric value for a side.
    pub fn sub_score(&self, side: Side, metric: &str) -> Option<f64> {
        self.breakdown.get(&side).and_then(|m| m.get(metric)).copied()
    }

    /// Metric value for a side on the 0..100 display scale.
    pub fn scaled_sub_score(&self, side: Side, metric: Metric) -> Option<f64> {
        self.sub_score(side, metric.key()).map(|raw| metric.scale(raw))
    }

    /// Participant name for a side, falling back to `Side A` / `Side B`.
    pub fn side_name(&self, side: Side) -> String {
        self.side_names
            .get(&side)
            .cloned()
            .unwrap_or_else(|| format!("Side {}", side))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultsRecord {
    #[serde(default, alias = "winnerSide")]
    winner: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    users: BTreeMap<String, Value>,
    #[serde(default, alias = "perSideTotals")]
    totals: BTreeMap<String, Value>,
    #[serde(default, alias = "perSideMetricBreakdown", alias = "breakdown")]
    scores: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coherence: Option<Value>,
    #[serde(default)]
    source: ResultsSource,
    #[serde(default)]
    unassigned_arguments: usize,
}

fn side_key(key: &str) -> Option<Side> {
    key.parse().ok()
}

fn coerce(value: Value) -> Option<f64> {
    MetricValue::from(value).coerce()
}

/// `username`, else `email`, of a `users` entry; a bare string is the name itself.
fn user_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["username", "email"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        }),
        _ => None,
    }?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

impl From<ResultsRecord> for Results {
    fn from(record: ResultsRecord) -> Self {
        let totals: BTreeMap<Side, f64> = record
            .totals
            .into_iter()
            .filter_map(|(k, v)| Some((side_key(&k)?, coerce(v)?)))
            .collect();

        let breakdown = record
            .scores
            .into_iter()
            .filter_map(|(k, metrics)| {
                let side = side_key(&k)?;
                let metrics = metrics
                    .into_iter()
                    .filter_map(|(name, v)| Some((name, coerce(v)?)))
                    .collect();
                Some((side, metrics))
            })
            .collect();

        let side_names = record
            .users
            .iter()
            .filter_map(|(k, v)| Some((side_key(k)?, user_name(v)?)))
            .collect();

        // A missing or unrecognized winner is derived from the totals.
        let outcome = record
            .winner
            .as_deref()
            .and_then(Outcome::from_wire)
            .unwrap_or_else(|| {
                let a = totals.get(&Side::A).copied().unwrap_or(0.0);
                let b = totals.get(&Side::B).copied().unwrap_or(0.0);
                Outcome::decide(a, b, TieBreak::Draw)
            });

        Results {
            outcome,
            totals,
            breakdown,
            side_names,
            coherence: record.coherence.and_then(RatedScore::from_wire),
            source: record.source,
            unassigned_arguments: record.unassigned_arguments,
        }
    }
}

impl From<Results> for ResultsRecord {
    fn from(results: Results) -> Self {
        let number = |n: f64| {
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        };
        ResultsRecord {
            winner: Some(match results.outcome {
                Outcome::Winner(side) => side.to_string(),
                Outcome::Draw => "draw".to_string(),
            }),
            users: results
                .side_names
                .into_iter()
                .map(|(side, name)| (side.to_string(), json!({ "username": name })))
                .collect(),
            totals: results
                .totals
                .into_iter()
                .map(|(side, total)| (side.to_string(), number(total)))
                .collect(),
            scores: results
                .breakdown
                .into_iter()
                .map(|(side, metrics)| {
                    let metrics = metrics
                        .into_iter()
                        .map(|(name, value)| (name, number(value)))
                        .collect();
                    (side.to_string(), metrics)
                })
                .collect(),
            coherence: results.coherence.map(|c| {
                Value::from(MetricValue::Scored {
                    score: c.score,
                    rating: c.rating,
                })
            }),
            source: results.source,
            unassigned_arguments: results.unassigned_arguments,
        }
    }
}
