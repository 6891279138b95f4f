//! Room state: the client's replica of one debate session.

use crate::results::{Results, TieBreak};
use crate::session::entities::{Argument, ChatMessage, DebateSession};
use crate::session::value_objects::{ArgumentId, ConnectionState, DebateId, UserId};
use serde::Serialize;
use std::collections::BTreeSet;

/// Lifecycle phase of the room.
///
/// Connection loss is tracked separately in [`RoomState::connection`] so the
/// phase survives a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    /// No session of interest.
    #[default]
    Idle,
    /// Join issued, waiting for a baseline.
    Joining,
    Active,
    /// A local finalize is in flight.
    Finalizing,
    Finalized,
}

impl RoomPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomPhase::Idle => "idle",
            RoomPhase::Joining => "joining",
            RoomPhase::Active => "active",
            RoomPhase::Finalizing => "finalizing",
            RoomPhase::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the last operation against the server did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    Snapshot(String),
    Finalize(String),
    Submit(String),
    Results(String),
    Connection(String),
}

impl FailureReason {
    pub fn message(&self) -> &str {
        match self {
            FailureReason::Snapshot(m)
            | FailureReason::Finalize(m)
            | FailureReason::Submit(m)
            | FailureReason::Results(m)
            | FailureReason::Connection(m) => m,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self {
            FailureReason::Snapshot(_) => "snapshot fetch failed",
            FailureReason::Finalize(_) => "finalize failed",
            FailureReason::Submit(_) => "submission failed",
            FailureReason::Results(_) => "results fetch failed",
            FailureReason::Connection(_) => "connection lost",
        };
        write!(f, "{}: {}", what, self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ArrivedArgument {
    #[serde(flatten)]
    argument: Argument,
    #[serde(skip)]
    arrival: u64,
}

/// Authoritative-as-possible replica of a debate room.
///
/// Only [`super::transition`] mutates it. Arguments are kept ordered by
/// `(submitted_at, arrival order)` and unique by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub debate_id: Option<DebateId>,
    pub phase: RoomPhase,
    pub connection: ConnectionState,
    pub session: Option<DebateSession>,
    arguments: Vec<ArrivedArgument>,
    #[serde(skip)]
    next_arrival: u64,
    /// Whether a snapshot or `debate-state` baseline has been applied.
    pub has_baseline: bool,
    pub typing: BTreeSet<UserId>,
    pub chat: Vec<ChatMessage>,
    pub results: Option<Results>,
    pub last_failure: Option<FailureReason>,
    #[serde(skip)]
    pub tie_break: TieBreak,
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new(TieBreak::default())
    }
}

impl RoomState {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            debate_id: None,
            phase: RoomPhase::Idle,
            connection: ConnectionState::Disconnected,
            session: None,
            arguments: Vec::new(),
            next_arrival: 0,
            has_baseline: false,
            typing: BTreeSet::new(),
            chat: Vec::new(),
            results: None,
            last_failure: None,
            tie_break,
        }
    }

    /// Arguments in display order.
    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().map(|a| &a.argument)
    }

    pub fn argument(&self, id: &ArgumentId) -> Option<&Argument> {
        self.arguments().find(|a| &a.id == id)
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Arguments still waiting for the scoring oracle.
    pub fn pending_scores(&self) -> usize {
        self.arguments().filter(|a| a.is_score_pending()).count()
    }

    pub fn is_interested_in(&self, debate_id: &DebateId) -> bool {
        self.debate_id.as_ref() == Some(debate_id)
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == RoomPhase::Finalized
    }

    /// Drop everything tied to the current session, keeping connection
    /// status and settings.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            connection: self.connection,
            ..Self::new(self.tie_break)
        };
    }

    /// Insert or upgrade an argument.
    ///
    /// A known id only has its score upgraded when the stored one is still
    /// pending. Returns whether anything changed.
    pub(crate) fn merge_argument(&mut self, mut argument: Argument) -> bool {
        if let Some(existing) = self
            .arguments
            .iter_mut()
            .find(|a| a.argument.id == argument.id)
        {
            if existing.argument.is_score_pending() && !argument.is_score_pending() {
                existing.argument.raw_score = argument.raw_score;
                return true;
            }
            return false;
        }

        if argument.session_id.as_str().is_empty()
            && let Some(id) = &self.debate_id
        {
            argument.session_id = id.clone();
        }

        let arrival = self.next_arrival;
        self.next_arrival += 1;
        let position = self.arguments.partition_point(|a| {
            (a.argument.submitted_at, a.arrival) <= (argument.submitted_at, arrival)
        });
        self.arguments
            .insert(position, ArrivedArgument { argument, arrival });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn argument(id: &str, second: u32) -> Argument {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, second).unwrap();
        Argument::new(id, "d1", "u1", "text", at)
    }

    #[test]
    fn test_merge_orders_by_timestamp_then_arrival() {
        let mut state = RoomState::default();
        state.merge_argument(argument("late", 30));
        state.merge_argument(argument("early", 10));
        state.merge_argument(argument("tie-1", 20));
        state.merge_argument(argument("tie-2", 20));

        let ids: Vec<&str> = state.arguments().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "tie-1", "tie-2", "late"]);
    }

    #[test]
    fn test_merge_dedups_by_id() {
        let mut state = RoomState::default();
        assert!(state.merge_argument(argument("a1", 1)));
        assert!(!state.merge_argument(argument("a1", 1)));
        assert_eq!(state.argument_count(), 1);
    }

    #[test]
    fn test_merge_upgrades_pending_score_only() {
        use crate::score::RawScore;

        let mut state = RoomState::default();
        state.merge_argument(argument("a1", 1));
        assert_eq!(state.pending_scores(), 1);

        assert!(state.merge_argument(argument("a1", 1).with_score(RawScore::Numeric(7.0))));
        assert_eq!(state.pending_scores(), 0);

        // A scored record is never overwritten.
        assert!(!state.merge_argument(argument("a1", 1).with_score(RawScore::Numeric(1.0))));
        let stored = state.argument(&ArgumentId::new("a1")).unwrap();
        assert_eq!(stored.raw_score, RawScore::Numeric(7.0));
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::Finalize("API error".to_string());
        assert_eq!(reason.to_string(), "finalize failed: API error");
    }
}
