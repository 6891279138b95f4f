//! Lobby use case
//!
//! One-shot session lifecycle calls: list open debates, create, join by id
//! or invite code, and fetch results. Input is validated before any request
//! is made.

use crate::ports::debate_api::{ApiError, DebateApi};
use debate_domain::{DebateDraft, DebateId, DebateSession, OpenDebate, Results, ValidationError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur in lobby operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LobbyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Use case for session lifecycle calls outside a room
pub struct LobbyUseCase<A: DebateApi + 'static> {
    api: Arc<A>,
}

impl<A: DebateApi + 'static> LobbyUseCase<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn open_debates(&self) -> Result<Vec<OpenDebate>, LobbyError> {
        Ok(self.api.open_debates().await?)
    }

    /// Create a session; the caller becomes side A.
    pub async fn create(&self, draft: DebateDraft) -> Result<DebateSession, LobbyError> {
        draft.validate()?;
        let session = self.api.create(&draft).await?;
        info!(debate_id = %session.id, private = draft.is_private, "Debate created");
        Ok(session)
    }

    pub async fn join(&self, debate_id: &DebateId) -> Result<DebateSession, LobbyError> {
        if debate_id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyDebateId.into());
        }
        let session = self.api.join(debate_id).await?;
        info!(debate_id = %session.id, "Joined debate");
        Ok(session)
    }

    pub async fn join_private(&self, invite_code: &str) -> Result<DebateSession, LobbyError> {
        let invite_code = invite_code.trim();
        if invite_code.is_empty() {
            return Err(ValidationError::EmptyInviteCode.into());
        }
        let session = self.api.join_private(invite_code).await?;
        info!(debate_id = %session.id, "Joined private debate");
        Ok(session)
    }

    pub async fn results(&self, debate_id: &DebateId) -> Result<Results, LobbyError> {
        if debate_id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyDebateId.into());
        }
        Ok(self.api.results(debate_id).await?)
    }
}
