//! Session behavior from TOML (`[session]` section)

use super::issue::ConfigIssue;
use debate_application::SubmissionTransport;
use debate_domain::TieBreak;
use serde::{Deserialize, Serialize};

/// Raw session configuration from TOML
///
/// ```toml
/// [session]
/// submission = "live"     # live | http
/// tie_break = "draw"      # draw | first-side
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub submission: String,
    pub tie_break: String,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            submission: "live".to_string(),
            tie_break: "draw".to_string(),
        }
    }
}

impl FileSessionConfig {
    /// Parse `submission`, falling back to the default with a warning.
    pub fn parse_submission(&self) -> (SubmissionTransport, Vec<ConfigIssue>) {
        match self.submission.parse() {
            Ok(transport) => (transport, Vec::new()),
            Err(_) => (
                SubmissionTransport::default(),
                vec![ConfigIssue::invalid_enum(
                    "session.submission",
                    &self.submission,
                    &["live", "http"],
                )],
            ),
        }
    }

    /// Parse `tie_break`, falling back to the default with a warning.
    pub fn parse_tie_break(&self) -> (TieBreak, Vec<ConfigIssue>) {
        match self.tie_break.parse() {
            Ok(tie_break) => (tie_break, Vec::new()),
            Err(_) => (
                TieBreak::default(),
                vec![ConfigIssue::invalid_enum(
                    "session.tie_break",
                    &self.tie_break,
                    &["draw", "first-side"],
                )],
            ),
        }
    }
}
