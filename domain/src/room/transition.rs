//! Pure state transitions for the debate room.

use super::effect::Effect;
use super::event::RoomEvent;
use super::state::{FailureReason, RoomPhase, RoomState};
use crate::core::error::ValidationError;
use crate::results::{Results, ResultsAggregator, ResultsSource};
use crate::session::entities::{Argument, ParticipantRecord};
use crate::session::value_objects::{ConnectionState, DebateId};

/// Arguments required before a debate may be finalized.
pub const MIN_ARGUMENTS_TO_FINALIZE: usize = 2;

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: RoomState,
    /// Side effects to perform, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: RoomState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: RoomState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Apply an event, discarding effects. Rejected intents leave the state
/// unchanged.
pub fn apply(state: RoomState, event: RoomEvent) -> RoomState {
    match transition(&state, event) {
        Ok(transition) => transition.state,
        Err(_) => state,
    }
}

/// Compute the next state and the effects the caller must perform.
///
/// Only local intents can fail; server and transport observations that do
/// not concern the session of interest are ignored.
pub fn transition(state: &RoomState, event: RoomEvent) -> Result<Transition, ValidationError> {
    let mut next = state.clone();

    match event {
        // ==================== Local intents ====================
        RoomEvent::JoinRequested { debate_id } => {
            if debate_id.as_str().trim().is_empty() {
                return Err(ValidationError::EmptyDebateId);
            }
            if state.is_interested_in(&debate_id) && state.phase != RoomPhase::Idle {
                return Ok(Transition::to(next));
            }

            let mut effects = Vec::new();
            if let Some(previous) = state.debate_id.clone() {
                effects.push(Effect::LeaveLive {
                    debate_id: previous,
                });
            }
            next.reset();
            next.debate_id = Some(debate_id.clone());
            next.phase = RoomPhase::Joining;
            // Snapshot and live join race; merge_argument reconciles them.
            effects.push(Effect::FetchSnapshot {
                debate_id: debate_id.clone(),
            });
            effects.push(Effect::JoinLive { debate_id });
            Ok(Transition::with(next, effects))
        }

        RoomEvent::LeaveRequested => {
            let debate_id = joined_id(state)?;
            next.reset();
            Ok(Transition::with(next, vec![Effect::LeaveLive { debate_id }]))
        }

        RoomEvent::SubmitRequested { content } => {
            let content = content.trim();
            if content.is_empty() {
                return Err(ValidationError::EmptyArgument);
            }
            let debate_id = joined_id(state)?;
            match state.phase {
                RoomPhase::Active => {}
                RoomPhase::Finalized => return Err(ValidationError::AlreadyFinalized),
                phase => {
                    return Err(ValidationError::InvalidPhase {
                        action: "submit",
                        phase: phase.as_str(),
                    });
                }
            }
            if matches!(next.last_failure, Some(FailureReason::Submit(_))) {
                next.last_failure = None;
            }
            Ok(Transition::with(
                next,
                vec![Effect::SubmitArgument {
                    debate_id,
                    content: content.to_string(),
                }],
            ))
        }

        RoomEvent::FinalizeRequested => {
            let debate_id = joined_id(state)?;
            let session_finalized = state.session.as_ref().is_some_and(|s| s.finalized);
            match state.phase {
                RoomPhase::Finalized => return Err(ValidationError::AlreadyFinalized),
                _ if session_finalized => return Err(ValidationError::AlreadyFinalized),
                RoomPhase::Finalizing => return Err(ValidationError::FinalizeInProgress),
                RoomPhase::Active => {}
                phase => {
                    return Err(ValidationError::InvalidPhase {
                        action: "finalize",
                        phase: phase.as_str(),
                    });
                }
            }
            if state.argument_count() < MIN_ARGUMENTS_TO_FINALIZE {
                return Err(ValidationError::NotEnoughArguments {
                    min: MIN_ARGUMENTS_TO_FINALIZE,
                    actual: state.argument_count(),
                });
            }
            next.phase = RoomPhase::Finalizing;
            if matches!(next.last_failure, Some(FailureReason::Finalize(_))) {
                next.last_failure = None;
            }
            Ok(Transition::with(next, vec![Effect::PostFinalize { debate_id }]))
        }

        RoomEvent::TypingChanged { typing } => {
            let debate_id = joined_id(state)?;
            if state.phase == RoomPhase::Finalized {
                return Err(ValidationError::AlreadyFinalized);
            }
            Ok(Transition::with(
                next,
                vec![Effect::SendTyping { debate_id, typing }],
            ))
        }

        RoomEvent::ChatRequested { message } => {
            let message = message.trim();
            if message.is_empty() {
                return Err(ValidationError::EmptyMessage);
            }
            let debate_id = joined_id(state)?;
            Ok(Transition::with(
                next,
                vec![Effect::SendChat {
                    debate_id,
                    message: message.to_string(),
                }],
            ))
        }

        RoomEvent::RefreshRequested => {
            let debate_id = joined_id(state)?;
            Ok(Transition::with(next, vec![Effect::FetchSnapshot { debate_id }]))
        }

        RoomEvent::ResultsRequested => {
            let debate_id = joined_id(state)?;
            Ok(Transition::with(next, vec![Effect::FetchResults { debate_id }]))
        }

        // ==================== Point-in-time responses ====================
        RoomEvent::SnapshotLoaded { session, arguments } => {
            if !concerns(state, Some(&session.id)) {
                return Ok(Transition::to(next));
            }

            let was_finalized = state.phase == RoomPhase::Finalized;
            let mut merged = session;
            // Sides already known for this session never change.
            if let Some(existing) = next.session.take() {
                let incoming = std::mem::replace(&mut merged.participants, existing.participants);
                for participant in incoming {
                    merged.seat(ParticipantRecord::from(participant));
                }
            }
            let server_finalized = merged.finalized;
            next.session = Some(merged);
            next.has_baseline = true;
            if matches!(next.last_failure, Some(FailureReason::Snapshot(_))) {
                next.last_failure = None;
            }

            if !was_finalized {
                merge_arguments(&mut next, arguments);
            }

            let mut effects = Vec::new();
            match (next.phase, server_finalized) {
                (RoomPhase::Finalized, _) => mark_session_finalized(&mut next, true),
                (_, true) => {
                    finalize(&mut next, None);
                    if let Some(debate_id) = next.debate_id.clone() {
                        effects.push(Effect::FetchResults { debate_id });
                    }
                }
                (RoomPhase::Joining, false) => next.phase = RoomPhase::Active,
                _ => {}
            }
            Ok(Transition::with(next, effects))
        }

        RoomEvent::SnapshotFailed { debate_id, message } => {
            if concerns(state, Some(&debate_id)) {
                next.last_failure = Some(FailureReason::Snapshot(message));
            }
            Ok(Transition::to(next))
        }

        RoomEvent::SubmitFailed { debate_id, message } => {
            if concerns(state, Some(&debate_id)) {
                next.last_failure = Some(FailureReason::Submit(message));
            }
            Ok(Transition::to(next))
        }

        RoomEvent::FinalizeFailed { debate_id, message } => {
            if concerns(state, Some(&debate_id)) {
                if state.phase == RoomPhase::Finalizing {
                    next.phase = RoomPhase::Active;
                }
                next.last_failure = Some(FailureReason::Finalize(message));
            }
            Ok(Transition::to(next))
        }

        RoomEvent::ResultsLoaded { debate_id, results } => {
            if concerns(state, Some(&debate_id)) {
                next.results = Some(results);
                if matches!(next.last_failure, Some(FailureReason::Results(_))) {
                    next.last_failure = None;
                }
            }
            Ok(Transition::to(next))
        }

        RoomEvent::ResultsFailed { debate_id, message } => {
            if concerns(state, Some(&debate_id)) {
                next.last_failure = Some(FailureReason::Results(message));
                if next.is_finalized() && next.results.is_none() {
                    next.results = compute_local(&next);
                }
            }
            Ok(Transition::to(next))
        }

        // ==================== Live channel ====================
        RoomEvent::UserJoined {
            debate_id,
            participant,
        } => {
            if concerns(state, debate_id.as_ref())
                && let Some(session) = next.session.as_mut()
            {
                session.seat(participant);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::UserLeft { debate_id, user_id } => {
            if concerns(state, debate_id.as_ref()) {
                if let Some(session) = next.session.as_mut() {
                    session.set_presence(&user_id, ConnectionState::Disconnected);
                }
                next.typing.remove(&user_id);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::ArgumentProcessing { argument } | RoomEvent::ArgumentAdded { argument } => {
            if accepts_arguments(state, &argument) {
                next.typing.remove(&argument.author_id);
                next.merge_argument(argument);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::UserTyping { debate_id, user_id } => {
            if concerns(state, debate_id.as_ref()) && !state.is_finalized() {
                next.typing.insert(user_id);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::UserStoppedTyping { debate_id, user_id } => {
            if concerns(state, debate_id.as_ref()) {
                next.typing.remove(&user_id);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::ChatReceived { mut message } => {
            let named = (!message.debate_id.as_str().is_empty()).then(|| message.debate_id.clone());
            if concerns(state, named.as_ref())
                && let Some(debate_id) = state.debate_id.clone()
            {
                message.debate_id = debate_id;
                next.chat.push(message);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::DebateFinalized {
            debate_id,
            results,
        } => {
            if !concerns(state, Some(&debate_id)) {
                return Ok(Transition::to(next));
            }
            if state.is_finalized() {
                // Repeated notification: only a server result may replace a local one.
                let replace = results.is_some()
                    && next
                        .results
                        .as_ref()
                        .is_none_or(|r| r.source == ResultsSource::Local);
                if replace {
                    next.results = results;
                }
            } else {
                finalize(&mut next, results);
            }
            Ok(Transition::to(next))
        }

        RoomEvent::StatusUpdated {
            debate_id,
            finalized,
            results,
        } => {
            if !concerns(state, Some(&debate_id)) {
                return Ok(Transition::to(next));
            }
            if finalized {
                if state.is_finalized() {
                    if results.is_some() {
                        next.results = results;
                    }
                } else {
                    finalize(&mut next, results);
                }
            } else {
                next.phase = RoomPhase::Active;
                next.results = None;
                mark_session_finalized(&mut next, false);
            }
            Ok(Transition::to(next))
        }

        // ==================== Transport ====================
        RoomEvent::ConnectionLost { reason } => {
            next.connection = ConnectionState::Disconnected;
            next.typing.clear();
            next.last_failure = Some(FailureReason::Connection(reason));
            Ok(Transition::to(next))
        }

        RoomEvent::Reconnected => {
            next.connection = ConnectionState::Connected;
            if matches!(next.last_failure, Some(FailureReason::Connection(_))) {
                next.last_failure = None;
            }
            let mut effects = Vec::new();
            if state.phase != RoomPhase::Idle
                && let Some(debate_id) = state.debate_id.clone()
            {
                // Re-join, then refresh to recover arguments lost before echo.
                effects.push(Effect::JoinLive {
                    debate_id: debate_id.clone(),
                });
                effects.push(Effect::FetchSnapshot { debate_id });
            }
            Ok(Transition::with(next, effects))
        }
    }
}

fn joined_id(state: &RoomState) -> Result<DebateId, ValidationError> {
    match (&state.debate_id, state.phase) {
        (Some(id), phase) if phase != RoomPhase::Idle => Ok(id.clone()),
        _ => Err(ValidationError::NotJoined),
    }
}

/// Whether an observation concerns the session of interest. `None` means the
/// payload did not name a session.
fn concerns(state: &RoomState, debate_id: Option<&DebateId>) -> bool {
    if state.phase == RoomPhase::Idle {
        return false;
    }
    match debate_id {
        Some(id) => state.is_interested_in(id),
        None => state.debate_id.is_some(),
    }
}

fn accepts_arguments(state: &RoomState, argument: &Argument) -> bool {
    match &state.debate_id {
        Some(id) => {
            state.phase != RoomPhase::Idle && !state.is_finalized() && argument.belongs_to(id)
        }
        None => false,
    }
}

fn merge_arguments(state: &mut RoomState, arguments: Vec<Argument>) {
    let Some(debate_id) = state.debate_id.clone() else {
        return;
    };
    for argument in arguments.into_iter().filter(|a| a.belongs_to(&debate_id)) {
        state.merge_argument(argument);
    }
}

fn mark_session_finalized(state: &mut RoomState, finalized: bool) {
    if let Some(session) = state.session.as_mut() {
        session.finalized = finalized;
    }
}

/// Enter `Finalized`, using server results when given and local ones otherwise.
fn finalize(state: &mut RoomState, results: Option<Results>) {
    state.phase = RoomPhase::Finalized;
    state.typing.clear();
    mark_session_finalized(state, true);
    if matches!(state.last_failure, Some(FailureReason::Finalize(_))) {
        state.last_failure = None;
    }
    state.results = match results {
        Some(results) => Some(results),
        None => compute_local(state),
    };
}

fn compute_local(state: &RoomState) -> Option<Results> {
    let session = state.session.as_ref()?;
    let arguments: Vec<Argument> = state.arguments().cloned().collect();
    Some(ResultsAggregator::new(state.tie_break).aggregate(session, &arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Outcome, TieBreak};
    use crate::score::RawScore;
    use crate::session::entities::{ChatMessage, DebateSession};
    use crate::session::value_objects::{ArgumentId, Side, UserId};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, second).unwrap()
    }

    fn did() -> DebateId {
        DebateId::new("d1")
    }

    fn session() -> DebateSession {
        let mut session = DebateSession::new("d1", "AI vs Humans");
        session.seat(ParticipantRecord::new("alice"));
        session.seat(ParticipantRecord::new("bob"));
        session
    }

    fn argument(id: &str, author: &str, second: u32) -> Argument {
        Argument::new(id, "d1", author, format!("argument {id}"), at(second))
    }

    fn scored(id: &str, author: &str, second: u32) -> Argument {
        argument(id, author, second).with_score(RawScore::from(json!({
            "clarity": 0.9, "sentiment": 0.5, "vocab_richness": 0.7,
            "avg_word_len": 5, "length": 800
        })))
    }

    fn run(events: Vec<RoomEvent>) -> RoomState {
        events.into_iter().fold(RoomState::default(), apply)
    }

    fn joined() -> RoomState {
        run(vec![
            RoomEvent::Reconnected,
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![],
            },
        ])
    }

    fn with_arguments(n: usize) -> RoomState {
        (0..n).fold(joined(), |state, i| {
            let author = if i % 2 == 0 { "alice" } else { "bob" };
            apply(
                state,
                RoomEvent::ArgumentAdded {
                    argument: scored(&format!("a{i}"), author, i as u32),
                },
            )
        })
    }

    fn ids(state: &RoomState) -> Vec<String> {
        state.arguments().map(|a| a.id.to_string()).collect()
    }

    // ==================== Join ====================

    #[test]
    fn test_join_issues_snapshot_and_live_join() {
        let t = transition(&RoomState::default(), RoomEvent::JoinRequested { debate_id: did() })
            .unwrap();
        assert_eq!(t.state.phase, RoomPhase::Joining);
        assert_eq!(
            t.effects,
            vec![
                Effect::FetchSnapshot { debate_id: did() },
                Effect::JoinLive { debate_id: did() },
            ]
        );
    }

    #[test]
    fn test_join_rejects_empty_id() {
        let err = transition(
            &RoomState::default(),
            RoomEvent::JoinRequested {
                debate_id: DebateId::new(" "),
            },
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyDebateId);
    }

    #[test]
    fn test_rejoin_same_session_is_noop() {
        let state = joined();
        let t = transition(&state, RoomEvent::JoinRequested { debate_id: did() }).unwrap();
        assert!(t.effects.is_empty());
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_switching_session_leaves_then_joins() {
        let state = with_arguments(2);
        let t = transition(
            &state,
            RoomEvent::JoinRequested {
                debate_id: DebateId::new("d2"),
            },
        )
        .unwrap();
        assert_eq!(t.effects[0], Effect::LeaveLive { debate_id: did() });
        assert_eq!(t.state.argument_count(), 0);
        assert!(t.state.session.is_none());
        assert!(t.state.is_connected());
    }

    #[test]
    fn test_snapshot_establishes_active_baseline() {
        let state = joined();
        assert_eq!(state.phase, RoomPhase::Active);
        assert!(state.has_baseline);
    }

    #[test]
    fn test_finalized_snapshot_goes_straight_to_finalized() {
        let mut finalized = session();
        finalized.finalized = true;
        let state = run(vec![RoomEvent::JoinRequested { debate_id: did() }]);
        let t = transition(
            &state,
            RoomEvent::SnapshotLoaded {
                session: finalized,
                arguments: vec![scored("a1", "alice", 1), scored("a2", "bob", 2)],
            },
        )
        .unwrap();
        assert_eq!(t.state.phase, RoomPhase::Finalized);
        assert_eq!(t.effects, vec![Effect::FetchResults { debate_id: did() }]);
        assert_eq!(t.state.results.as_ref().unwrap().source, ResultsSource::Local);
    }

    #[test]
    fn test_live_before_snapshot_merges_without_duplicates() {
        let state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::ArgumentAdded {
                argument: argument("a2", "bob", 2),
            },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![argument("a1", "alice", 1), argument("a2", "bob", 2)],
            },
        ]);
        assert_eq!(ids(&state), vec!["a1", "a2"]);
        assert_eq!(state.phase, RoomPhase::Active);
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let state = joined();
        let mut other = session();
        other.id = DebateId::new("d0");
        let next = apply(
            state.clone(),
            RoomEvent::SnapshotLoaded {
                session: other,
                arguments: vec![argument("x", "alice", 1)],
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_snapshot_keeps_known_sides() {
        let state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![],
            },
        ]);
        // A later snapshot lists the users in the opposite order.
        let mut reordered = DebateSession::new("d1", "AI vs Humans");
        reordered.seat(ParticipantRecord::new("bob"));
        reordered.seat(ParticipantRecord::new("alice"));
        let state = apply(
            state,
            RoomEvent::SnapshotLoaded {
                session: reordered,
                arguments: vec![],
            },
        );
        let session = state.session.unwrap();
        assert_eq!(session.side_of(&UserId::new("alice")), Some(Side::A));
        assert_eq!(session.side_of(&UserId::new("bob")), Some(Side::B));
    }

    #[test]
    fn test_snapshot_failure_keeps_last_good_state() {
        let state = with_arguments(2);
        let next = apply(
            state.clone(),
            RoomEvent::SnapshotFailed {
                debate_id: did(),
                message: "API error".into(),
            },
        );
        assert_eq!(next.phase, RoomPhase::Active);
        assert_eq!(next.argument_count(), 2);
        assert_eq!(
            next.last_failure,
            Some(FailureReason::Snapshot("API error".into()))
        );
    }

    // ==================== Arguments ====================

    #[test]
    fn test_submit_is_fire_and_forget() {
        let state = joined();
        let t = transition(
            &state,
            RoomEvent::SubmitRequested {
                content: "  Humans adapt  ".into(),
            },
        )
        .unwrap();
        assert_eq!(t.state.argument_count(), 0);
        assert_eq!(
            t.effects,
            vec![Effect::SubmitArgument {
                debate_id: did(),
                content: "Humans adapt".into()
            }]
        );
    }

    #[test]
    fn test_submit_guards() {
        let empty = transition(&joined(), RoomEvent::SubmitRequested { content: "  ".into() });
        assert_eq!(empty.unwrap_err(), ValidationError::EmptyArgument);

        let idle = transition(
            &RoomState::default(),
            RoomEvent::SubmitRequested { content: "x".into() },
        );
        assert_eq!(idle.unwrap_err(), ValidationError::NotJoined);

        let joining = run(vec![RoomEvent::JoinRequested { debate_id: did() }]);
        let err = transition(&joining, RoomEvent::SubmitRequested { content: "x".into() });
        assert!(matches!(err, Err(ValidationError::InvalidPhase { .. })));
    }

    #[test]
    fn test_duplicate_argument_added_is_idempotent() {
        let state = with_arguments(1);
        let again = apply(
            state.clone(),
            RoomEvent::ArgumentAdded {
                argument: scored("a0", "alice", 0),
            },
        );
        assert_eq!(again, state);
    }

    #[test]
    fn test_processing_then_added_upgrades_score() {
        let state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![],
            },
            RoomEvent::ArgumentProcessing {
                argument: argument("a1", "alice", 1),
            },
        ]);
        assert_eq!(state.pending_scores(), 1);

        let state = apply(
            state,
            RoomEvent::ArgumentAdded {
                argument: scored("a1", "alice", 1),
            },
        );
        assert_eq!(state.pending_scores(), 0);
        assert_eq!(state.argument_count(), 1);
    }

    #[test]
    fn test_arguments_ordered_by_server_timestamp() {
        let state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::ArgumentAdded {
                argument: argument("late", "bob", 9),
            },
            RoomEvent::ArgumentAdded {
                argument: argument("early", "alice", 3),
            },
        ]);
        assert_eq!(ids(&state), vec!["early", "late"]);
    }

    #[test]
    fn test_argument_for_other_session_is_ignored() {
        let mut foreign = argument("x", "alice", 1);
        foreign.session_id = DebateId::new("d9");
        let state = apply(joined(), RoomEvent::ArgumentAdded { argument: foreign });
        assert_eq!(state.argument_count(), 0);
    }

    #[test]
    fn test_argument_clears_author_typing() {
        let state = apply(
            joined(),
            RoomEvent::UserTyping {
                debate_id: Some(did()),
                user_id: UserId::new("alice"),
            },
        );
        assert!(state.typing.contains(&UserId::new("alice")));
        let state = apply(
            state,
            RoomEvent::ArgumentAdded {
                argument: argument("a1", "alice", 1),
            },
        );
        assert!(state.typing.is_empty());
    }

    // ==================== Finalize ====================

    #[test]
    fn test_finalize_with_too_few_arguments_has_no_effects() {
        let state = with_arguments(1);
        let err = transition(&state, RoomEvent::FinalizeRequested).unwrap_err();
        assert_eq!(err, ValidationError::NotEnoughArguments { min: 2, actual: 1 });
        assert_eq!(apply(state.clone(), RoomEvent::FinalizeRequested), state);
    }

    #[test]
    fn test_finalize_moves_to_finalizing() {
        let t = transition(&with_arguments(2), RoomEvent::FinalizeRequested).unwrap();
        assert_eq!(t.state.phase, RoomPhase::Finalizing);
        assert_eq!(t.effects, vec![Effect::PostFinalize { debate_id: did() }]);

        let err = transition(&t.state, RoomEvent::FinalizeRequested).unwrap_err();
        assert_eq!(err, ValidationError::FinalizeInProgress);
    }

    #[test]
    fn test_finalize_on_finalized_session_is_rejected_locally() {
        let state = apply(
            with_arguments(2),
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        );
        let err = transition(&state, RoomEvent::FinalizeRequested).unwrap_err();
        assert_eq!(err, ValidationError::AlreadyFinalized);
    }

    #[test]
    fn test_finalize_failure_returns_to_active() {
        let state = apply(with_arguments(2), RoomEvent::FinalizeRequested);
        let state = apply(
            state,
            RoomEvent::FinalizeFailed {
                debate_id: did(),
                message: "Debate already finalized".into(),
            },
        );
        assert_eq!(state.phase, RoomPhase::Active);
        assert!(matches!(state.last_failure, Some(FailureReason::Finalize(_))));
    }

    #[test]
    fn test_debate_finalized_computes_local_results() {
        let state = apply(with_arguments(2), RoomEvent::FinalizeRequested);
        let state = apply(
            state,
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        );
        assert_eq!(state.phase, RoomPhase::Finalized);
        assert!(state.session.as_ref().unwrap().finalized);
        let results = state.results.unwrap();
        assert_eq!(results.source, ResultsSource::Local);
        assert_eq!(results.outcome, Outcome::Draw);
    }

    #[test]
    fn test_debate_finalized_merges_server_results() {
        let server = Results {
            outcome: Outcome::Winner(Side::B),
            totals: BTreeMap::from([(Side::A, 40.0), (Side::B, 60.0)]),
            breakdown: BTreeMap::new(),
            side_names: BTreeMap::new(),
            coherence: None,
            source: ResultsSource::Server,
            unassigned_arguments: 0,
        };
        let state = apply(
            with_arguments(2),
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        );
        let state = apply(
            state,
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: Some(server.clone()),
            },
        );
        assert_eq!(state.results, Some(server));
    }

    #[test]
    fn test_arguments_are_frozen_after_finalize() {
        let state = apply(
            with_arguments(2),
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        );
        let state = apply(
            state,
            RoomEvent::ArgumentAdded {
                argument: argument("late", "bob", 59),
            },
        );
        assert_eq!(state.argument_count(), 2);
        assert!(state.argument(&ArgumentId::new("late")).is_none());
    }

    #[test]
    fn test_status_update_overrides_in_flight_finalize() {
        let state = apply(with_arguments(2), RoomEvent::FinalizeRequested);
        let state = apply(
            state,
            RoomEvent::StatusUpdated {
                debate_id: did(),
                finalized: false,
                results: None,
            },
        );
        assert_eq!(state.phase, RoomPhase::Active);

        let state = apply(
            state,
            RoomEvent::StatusUpdated {
                debate_id: did(),
                finalized: true,
                results: None,
            },
        );
        assert_eq!(state.phase, RoomPhase::Finalized);

        // The server may also reopen a finalized debate.
        let state = apply(
            state,
            RoomEvent::StatusUpdated {
                debate_id: did(),
                finalized: false,
                results: None,
            },
        );
        assert_eq!(state.phase, RoomPhase::Active);
        assert!(state.results.is_none());
        assert!(!state.session.unwrap().finalized);
    }

    #[test]
    fn test_results_failure_falls_back_to_local() {
        let mut finalized = session();
        finalized.finalized = true;
        let mut state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: finalized,
                arguments: vec![scored("a1", "alice", 1)],
            },
        ]);
        state.results = None;
        let state = apply(
            state,
            RoomEvent::ResultsFailed {
                debate_id: did(),
                message: "API error".into(),
            },
        );
        assert_eq!(state.results.unwrap().source, ResultsSource::Local);
    }

    #[test]
    fn test_first_side_tie_break_is_used_locally() {
        let state = RoomState::new(TieBreak::FirstSide);
        let state = [
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![scored("a1", "alice", 1), scored("a2", "bob", 2)],
            },
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        ]
        .into_iter()
        .fold(state, apply);
        assert_eq!(state.results.unwrap().winner_side(), Some(Side::A));
    }

    // ==================== Presence, typing, chat ====================

    #[test]
    fn test_user_joined_and_left() {
        let mut lone = DebateSession::new("d1", "AI vs Humans");
        lone.seat(ParticipantRecord::new("alice"));
        let state = run(vec![
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::SnapshotLoaded {
                session: lone,
                arguments: vec![],
            },
            RoomEvent::UserJoined {
                debate_id: Some(did()),
                participant: ParticipantRecord::new("bob").with_display_name("Bob"),
            },
        ]);
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.side_of(&UserId::new("bob")), Some(Side::B));

        let state = apply(
            state,
            RoomEvent::UserLeft {
                debate_id: None,
                user_id: UserId::new("bob"),
            },
        );
        let bob = state
            .session
            .as_ref()
            .unwrap()
            .participant(&UserId::new("bob"))
            .unwrap()
            .clone();
        assert_eq!(bob.connection_state, ConnectionState::Disconnected);
        assert_eq!(bob.side, Side::B);
    }

    #[test]
    fn test_chat_received_and_requested() {
        let message = ChatMessage {
            id: None,
            debate_id: DebateId::new(""),
            user_id: UserId::new("bob"),
            display_name: None,
            message: "good point".into(),
            sent_at: None,
        };
        let state = apply(joined(), RoomEvent::ChatReceived { message });
        assert_eq!(state.chat.len(), 1);
        assert_eq!(state.chat[0].debate_id, did());

        let err = transition(&state, RoomEvent::ChatRequested { message: " ".into() });
        assert_eq!(err.unwrap_err(), ValidationError::EmptyMessage);
        let t = transition(&state, RoomEvent::ChatRequested { message: "hi".into() }).unwrap();
        assert_eq!(
            t.effects,
            vec![Effect::SendChat {
                debate_id: did(),
                message: "hi".into()
            }]
        );
    }

    // ==================== Connection ====================

    #[test]
    fn test_connection_loss_preserves_phase_and_reconnect_rejoins() {
        let state = apply(
            with_arguments(2),
            RoomEvent::ConnectionLost {
                reason: "reset by peer".into(),
            },
        );
        assert_eq!(state.phase, RoomPhase::Active);
        assert!(!state.is_connected());

        let t = transition(&state, RoomEvent::Reconnected).unwrap();
        assert!(t.state.is_connected());
        assert_eq!(t.state.phase, RoomPhase::Active);
        assert!(t.state.last_failure.is_none());
        assert_eq!(
            t.effects,
            vec![
                Effect::JoinLive { debate_id: did() },
                Effect::FetchSnapshot { debate_id: did() },
            ]
        );
    }

    #[test]
    fn test_reconnect_without_session_has_no_effects() {
        let t = transition(&RoomState::default(), RoomEvent::Reconnected).unwrap();
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_leave_resets_room() {
        let t = transition(&with_arguments(2), RoomEvent::LeaveRequested).unwrap();
        assert_eq!(t.state.phase, RoomPhase::Idle);
        assert_eq!(t.effects, vec![Effect::LeaveLive { debate_id: did() }]);
        assert_eq!(
            transition(&t.state, RoomEvent::LeaveRequested).unwrap_err(),
            ValidationError::NotJoined
        );
    }

    // ==================== Determinism ====================

    #[test]
    fn test_identical_event_sequences_converge() {
        let events = vec![
            RoomEvent::Reconnected,
            RoomEvent::JoinRequested { debate_id: did() },
            RoomEvent::ArgumentProcessing {
                argument: argument("a2", "bob", 2),
            },
            RoomEvent::SnapshotLoaded {
                session: session(),
                arguments: vec![scored("a1", "alice", 1)],
            },
            RoomEvent::ArgumentAdded {
                argument: scored("a2", "bob", 2),
            },
            RoomEvent::UserTyping {
                debate_id: None,
                user_id: UserId::new("alice"),
            },
            RoomEvent::FinalizeRequested,
            RoomEvent::DebateFinalized {
                debate_id: did(),
                results: None,
            },
        ];
        assert_eq!(run(events.clone()), run(events));
    }
}
