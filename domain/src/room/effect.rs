//! Side effects requested by a transition.
//!
//! The state machine never performs I/O. The caller executes these in order
//! and feeds any outcome back in as a [`super::RoomEvent`].

use crate::session::value_objects::DebateId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /debates/{id}/status` and `/arguments`, answered by
    /// `SnapshotLoaded` or `SnapshotFailed`.
    FetchSnapshot { debate_id: DebateId },
    /// `join-debate` on the live channel.
    JoinLive { debate_id: DebateId },
    /// `leave-debate` on the live channel.
    LeaveLive { debate_id: DebateId },
    /// Fire-and-forget submission. No local record is created.
    SubmitArgument { debate_id: DebateId, content: String },
    /// `typing` / `stop-typing`.
    SendTyping { debate_id: DebateId, typing: bool },
    SendChat { debate_id: DebateId, message: String },
    /// `POST /debates/{id}/finalize`, answered by `debate-finalized`,
    /// `debate-status-updated` or `FinalizeFailed`.
    PostFinalize { debate_id: DebateId },
    FetchResults { debate_id: DebateId },
}

impl Effect {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::FetchSnapshot { .. } => "fetch-snapshot",
            Effect::JoinLive { .. } => "join-live",
            Effect::LeaveLive { .. } => "leave-live",
            Effect::SubmitArgument { .. } => "submit-argument",
            Effect::SendTyping { .. } => "send-typing",
            Effect::SendChat { .. } => "send-chat",
            Effect::PostFinalize { .. } => "post-finalize",
            Effect::FetchResults { .. } => "fetch-results",
        }
    }

    pub fn debate_id(&self) -> &DebateId {
        match self {
            Effect::FetchSnapshot { debate_id }
            | Effect::JoinLive { debate_id }
            | Effect::LeaveLive { debate_id }
            | Effect::SubmitArgument { debate_id, .. }
            | Effect::SendTyping { debate_id, .. }
            | Effect::SendChat { debate_id, .. }
            | Effect::PostFinalize { debate_id }
            | Effect::FetchResults { debate_id } => debate_id,
        }
    }
}
