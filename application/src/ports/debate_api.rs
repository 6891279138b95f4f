//! Debate API port
//!
//! Point-in-time request/response calls against the debate server. Used for
//! snapshots, results, HTTP submission and the session lifecycle.

use async_trait::async_trait;
use debate_domain::{Argument, DebateDraft, DebateId, DebateSession, OpenDebate, Results};
use thiserror::Error;

/// Fallback message when the server does not explain a failure.
pub const DEFAULT_API_ERROR_MESSAGE: &str = "API error";

/// Errors that can occur during API calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    /// Message suitable for showing to a user.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Gateway for the debate server's HTTP API
#[async_trait]
pub trait DebateApi: Send + Sync {
    /// `GET /debates/{id}/status`
    async fn status(&self, debate_id: &DebateId) -> Result<DebateSession, ApiError>;

    /// `GET /debates/{id}/arguments`, in server order.
    async fn arguments(&self, debate_id: &DebateId) -> Result<Vec<Argument>, ApiError>;

    /// `POST /debates/{id}/arguments`
    ///
    /// Returns the stored record when the server echoes it back.
    async fn post_argument(
        &self,
        debate_id: &DebateId,
        content: &str,
    ) -> Result<Option<Argument>, ApiError>;

    /// `POST /debates/{id}/finalize`
    ///
    /// Returns the results when the server includes them in the response.
    async fn finalize(&self, debate_id: &DebateId) -> Result<Option<Results>, ApiError>;

    /// `GET /debates/{id}/results`
    async fn results(&self, debate_id: &DebateId) -> Result<Results, ApiError>;

    /// `GET /debates/open`
    async fn open_debates(&self) -> Result<Vec<OpenDebate>, ApiError>;

    /// `POST /debates`, or `POST /debates/private` for private drafts.
    async fn create(&self, draft: &DebateDraft) -> Result<DebateSession, ApiError>;

    /// `POST /debates/{id}/join`
    async fn join(&self, debate_id: &DebateId) -> Result<DebateSession, ApiError>;

    /// `POST /debates/join-private`
    async fn join_private(&self, invite_code: &str) -> Result<DebateSession, ApiError>;
}
