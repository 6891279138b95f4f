//! Domain error types

use thiserror::Error;

/// Input rejected locally, before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Topic must be at least {min} characters (got {actual})")]
    TopicTooShort { min: usize, actual: usize },

    #[error("Duration must be at least {min} minutes (got {actual})")]
    DurationTooShort { min: u32, actual: u32 },

    #[error("Debate id must not be empty")]
    EmptyDebateId,

    #[error("Invite code must not be empty")]
    EmptyInviteCode,

    #[error("Argument must not be empty")]
    EmptyArgument,

    #[error("Chat message must not be empty")]
    EmptyMessage,

    #[error("Not joined to a debate")]
    NotJoined,

    #[error("Debate is already finalized")]
    AlreadyFinalized,

    #[error("Finalize already in progress")]
    FinalizeInProgress,

    #[error("At least {min} arguments are required to finalize (got {actual})")]
    NotEnoughArguments { min: usize, actual: usize },

    #[error("Cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },
}

impl ValidationError {
    /// Whether the error comes from a finalize guard.
    pub fn is_finalize_guard(&self) -> bool {
        matches!(
            self,
            ValidationError::AlreadyFinalized
                | ValidationError::FinalizeInProgress
                | ValidationError::NotEnoughArguments { .. }
        )
    }
}
