//! Error types for the live channel adapter

use debate_application::ChannelError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised while opening or running the live connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Invalid live channel URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Handshake rejected with HTTP {status}")]
    Rejected { status: u16 },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

impl ConnectionError {
    /// 401 and 403 during the upgrade mean the token was refused.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ConnectionError::Rejected { status: 401 | 403 })
            || matches!(self, ConnectionError::InvalidToken(_))
    }

    /// Map a handshake failure, pulling the status out of HTTP rejections.
    pub(super) fn from_handshake(url: &str, error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::Http(response) => ConnectionError::Rejected {
                status: response.status().as_u16(),
            },
            tungstenite::Error::Url(e) => ConnectionError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            },
            other => ConnectionError::WebSocket(other),
        }
    }
}

impl From<ConnectionError> for ChannelError {
    fn from(error: ConnectionError) -> Self {
        if error.is_auth_failure() {
            return ChannelError::Unauthorized(error.to_string());
        }
        match error {
            ConnectionError::WebSocket(tungstenite::Error::ConnectionClosed)
            | ConnectionError::WebSocket(tungstenite::Error::AlreadyClosed) => ChannelError::Closed,
            ConnectionError::WebSocket(tungstenite::Error::Protocol(e)) => {
                ChannelError::Protocol(e.to_string())
            }
            other => ChannelError::ConnectionFailed(other.to_string()),
        }
    }
}
