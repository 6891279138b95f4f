//! Port for room transcripts.
//!
//! A transcript records, per debate, every room event the controller
//! applied, every side effect it started, intents it rejected and the
//! results it ended up with. It is separate from the `tracing` operation log.

use debate_domain::{DebateId, Results, ResultsSource, RoomPhase, Side};
use serde::Serialize;
use std::collections::BTreeMap;

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum TranscriptEntry {
    /// A room event was applied.
    Applied {
        event: &'static str,
        debate_id: Option<DebateId>,
        phase: RoomPhase,
        arguments: usize,
    },
    /// A side effect was started.
    Effect {
        effect: &'static str,
        debate_id: DebateId,
    },
    /// An intent failed local validation; the room did not change.
    Rejected {
        event: &'static str,
        debate_id: Option<DebateId>,
        phase: RoomPhase,
        error: String,
    },
    /// The room has results.
    Results {
        debate_id: Option<DebateId>,
        winner: Option<Side>,
        totals: BTreeMap<Side, f64>,
        source: ResultsSource,
    },
}

impl TranscriptEntry {
    pub fn results(debate_id: Option<DebateId>, results: &Results) -> Self {
        TranscriptEntry::Results {
            debate_id,
            winner: results.winner_side(),
            totals: results.totals.clone(),
            source: results.source,
        }
    }

    /// The debate this entry belongs to, if the room had one.
    pub fn debate_id(&self) -> Option<&DebateId> {
        match self {
            TranscriptEntry::Effect { debate_id, .. } => Some(debate_id),
            TranscriptEntry::Applied { debate_id, .. }
            | TranscriptEntry::Rejected { debate_id, .. }
            | TranscriptEntry::Results { debate_id, .. } => debate_id.as_ref(),
        }
    }
}

/// Port for writing transcripts.
///
/// `log` is synchronous and infallible; implementations swallow write errors.
pub trait SessionLogger: Send + Sync {
    fn log(&self, entry: TranscriptEntry);
}

/// No-op implementation for tests and when transcripts are disabled.
pub struct NoSessionLogger;

impl SessionLogger for NoSessionLogger {
    fn log(&self, _entry: TranscriptEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_domain::{Outcome, ResultsAggregator, TieBreak};
    use serde_json::json;

    #[test]
    fn test_entries_serialize_with_kind_tag() {
        let entry = TranscriptEntry::Applied {
            event: "argument-added",
            debate_id: Some(DebateId::new("d1")),
            phase: RoomPhase::Active,
            arguments: 3,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "kind": "applied",
                "event": "argument-added",
                "debateId": "d1",
                "phase": "active",
                "arguments": 3
            })
        );
    }

    #[test]
    fn test_results_entry_carries_winner_and_totals() {
        let session = debate_domain::DebateSession::new("d1", "AI vs Humans");
        let results = ResultsAggregator::new(TieBreak::Draw).aggregate(&session, &[]);
        assert_eq!(results.outcome, Outcome::Draw);

        let entry = TranscriptEntry::results(Some(DebateId::new("d1")), &results);
        assert_eq!(entry.debate_id(), Some(&DebateId::new("d1")));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "results");
        assert!(value["winner"].is_null());
        assert_eq!(value["totals"]["A"], 10.0);
        assert_eq!(value["source"], "local");
    }
}
