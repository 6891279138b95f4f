//! Local results computation.
//!
//! Groups arguments by their author's side, normalizes each score and
//! averages each metric per side. The breakdown keeps those raw means, the
//! same scale the server reports; a side's total is the mean of the five
//! clamped 0..100 sub-scores.

use super::entities::{Outcome, Results, ResultsSource, TieBreak};
use super::metric::Metric;
use crate::score::normalize;
use crate::session::entities::{Argument, DebateSession};
use crate::session::value_objects::Side;
use std::collections::BTreeMap;

/// Computes [`Results`] from the arguments of a session.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use debate_domain::results::{Outcome, ResultsAggregator, TieBreak};
/// use debate_domain::score::RawScore;
/// use debate_domain::session::entities::{Argument, DebateSession, ParticipantRecord};
///
/// let mut session = DebateSession::new("d1", "Tabs vs spaces");
/// session.seat(ParticipantRecord::new("alice"));
/// session.seat(ParticipantRecord::new("bob"));
///
/// let arguments = vec![
///     Argument::new("a1", "d1", "alice", "Tabs", Utc::now())
///         .with_score(RawScore::metrics([("clarity", 0.9)])),
///     Argument::new("a2", "d1", "bob", "Spaces", Utc::now())
///         .with_score(RawScore::metrics([("clarity", 0.4)])),
/// ];
///
/// let results = ResultsAggregator::new(TieBreak::Draw).aggregate(&session, &arguments);
/// assert_eq!(results.outcome, Outcome::Winner(debate_domain::Side::A));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsAggregator {
    tie_break: TieBreak,
}

impl ResultsAggregator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn aggregate(&self, session: &DebateSession, arguments: &[Argument]) -> Results {
        let mut samples: BTreeMap<Side, BTreeMap<Metric, Vec<f64>>> = BTreeMap::new();
        let mut unassigned_arguments = 0;

        for argument in arguments {
            let Some(side) = session.side_of(&argument.author_id) else {
                unassigned_arguments += 1;
                continue;
            };
            let score = normalize(&argument.raw_score);
            let side_samples = samples.entry(side).or_default();
            for metric in Metric::ALL {
                if let Some(value) = score.metric(metric.key()) {
                    side_samples.entry(metric).or_default().push(value);
                }
            }
        }

        let mut totals = BTreeMap::new();
        let mut breakdown = BTreeMap::new();
        for side in Side::ALL {
            let side_samples = samples.remove(&side).unwrap_or_default();
            let raw_means: BTreeMap<Metric, f64> = Metric::ALL
                .iter()
                .map(|metric| {
                    let raw = side_samples.get(metric).map(|v| mean(v)).unwrap_or(0.0);
                    (*metric, raw)
                })
                .collect();
            let total = raw_means
                .iter()
                .map(|(metric, raw)| metric.scale(*raw))
                .sum::<f64>()
                / Metric::ALL.len() as f64;
            totals.insert(side, total);
            breakdown.insert(
                side,
                raw_means
                    .into_iter()
                    .map(|(metric, raw)| (metric.key().to_string(), raw))
                    .collect(),
            );
        }

        let side_names = Side::ALL
            .into_iter()
            .filter_map(|side| {
                let participant = session.participant_on(side)?;
                Some((side, participant.display_name.clone()))
            })
            .collect();

        let outcome = Outcome::decide(totals[&Side::A], totals[&Side::B], self.tie_break);

        Results {
            outcome,
            totals,
            breakdown,
            side_names,
            coherence: None,
            source: ResultsSource::Local,
            unassigned_arguments,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
