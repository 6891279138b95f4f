//! Events fed into the room state machine.
//!
//! Local intents (`*Requested`) may be rejected with a
//! [`crate::core::error::ValidationError`]. Everything else is an observation
//! from the server or the transport and is never rejected; irrelevant
//! observations are ignored.

use crate::results::Results;
use crate::session::entities::{Argument, ChatMessage, DebateSession, ParticipantRecord};
use crate::session::value_objects::{DebateId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    // ==================== Local intents ====================
    /// Make a session the session of interest.
    JoinRequested { debate_id: DebateId },
    LeaveRequested,
    SubmitRequested { content: String },
    FinalizeRequested,
    TypingChanged { typing: bool },
    ChatRequested { message: String },
    /// Re-fetch the snapshot, e.g. after a suspected lost argument.
    RefreshRequested,
    ResultsRequested,

    // ==================== Point-in-time responses ====================
    /// A baseline: an HTTP snapshot or a live `debate-state` frame.
    SnapshotLoaded {
        session: DebateSession,
        arguments: Vec<Argument>,
    },
    SnapshotFailed { debate_id: DebateId, message: String },
    SubmitFailed { debate_id: DebateId, message: String },
    FinalizeFailed { debate_id: DebateId, message: String },
    ResultsLoaded { debate_id: DebateId, results: Results },
    ResultsFailed { debate_id: DebateId, message: String },

    // ==================== Live channel ====================
    UserJoined {
        debate_id: Option<DebateId>,
        participant: ParticipantRecord,
    },
    UserLeft {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    ArgumentProcessing { argument: Argument },
    ArgumentAdded { argument: Argument },
    UserTyping {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    UserStoppedTyping {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    ChatReceived { message: ChatMessage },
    DebateFinalized {
        debate_id: DebateId,
        results: Option<Results>,
    },
    /// Server-driven correction. Always wins over local state.
    StatusUpdated {
        debate_id: DebateId,
        finalized: bool,
        results: Option<Results>,
    },

    // ==================== Transport ====================
    ConnectionLost { reason: String },
    Reconnected,
}

impl RoomEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::JoinRequested { .. } => "join-requested",
            RoomEvent::LeaveRequested => "leave-requested",
            RoomEvent::SubmitRequested { .. } => "submit-requested",
            RoomEvent::FinalizeRequested => "finalize-requested",
            RoomEvent::TypingChanged { .. } => "typing-changed",
            RoomEvent::ChatRequested { .. } => "chat-requested",
            RoomEvent::RefreshRequested => "refresh-requested",
            RoomEvent::ResultsRequested => "results-requested",
            RoomEvent::SnapshotLoaded { .. } => "snapshot-loaded",
            RoomEvent::SnapshotFailed { .. } => "snapshot-failed",
            RoomEvent::SubmitFailed { .. } => "submit-failed",
            RoomEvent::FinalizeFailed { .. } => "finalize-failed",
            RoomEvent::ResultsLoaded { .. } => "results-loaded",
            RoomEvent::ResultsFailed { .. } => "results-failed",
            RoomEvent::UserJoined { .. } => "user-joined",
            RoomEvent::UserLeft { .. } => "user-left",
            RoomEvent::ArgumentProcessing { .. } => "argument-processing",
            RoomEvent::ArgumentAdded { .. } => "argument-added",
            RoomEvent::UserTyping { .. } => "user-typing",
            RoomEvent::UserStoppedTyping { .. } => "user-stopped-typing",
            RoomEvent::ChatReceived { .. } => "new-chat-message",
            RoomEvent::DebateFinalized { .. } => "debate-finalized",
            RoomEvent::StatusUpdated { .. } => "debate-status-updated",
            RoomEvent::ConnectionLost { .. } => "connection-lost",
            RoomEvent::Reconnected => "reconnected",
        }
    }
}
