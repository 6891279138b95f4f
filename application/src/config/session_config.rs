//! Session configuration: how the controller talks to the server.

use super::reconnect_policy::ReconnectPolicy;
use debate_domain::TieBreak;
use serde::{Deserialize, Serialize};

/// Which transport carries argument submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionTransport {
    /// `new-argument` on the live channel.
    #[default]
    Live,
    /// `POST /debates/{id}/arguments`.
    Http,
}

impl std::str::FromStr for SubmissionTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "ws" | "websocket" => Ok(SubmissionTransport::Live),
            "http" => Ok(SubmissionTransport::Http),
            other => Err(format!(
                "unknown submission transport '{}', expected live or http",
                other
            )),
        }
    }
}

/// Settings for [`SessionController`](crate::use_cases::session_controller::SessionController).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub submission: SubmissionTransport,
    pub tie_break: TieBreak,
    pub reconnect: ReconnectPolicy,
}

impl SessionConfig {
    pub fn with_submission(mut self, submission: SubmissionTransport) -> Self {
        self.submission = submission;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_transport_parse() {
        assert_eq!("HTTP".parse::<SubmissionTransport>().unwrap(), SubmissionTransport::Http);
        assert_eq!("live".parse::<SubmissionTransport>().unwrap(), SubmissionTransport::Live);
        assert!("carrier-pigeon".parse::<SubmissionTransport>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.submission, SubmissionTransport::Live);
        assert_eq!(config.tie_break, TieBreak::Draw);
        assert_eq!(config.reconnect.max_attempts, 8);
    }
}
