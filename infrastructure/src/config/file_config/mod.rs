//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod issue;
mod logging;
mod reconnect;
mod server;
mod session;

pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use logging::FileLoggingConfig;
pub use reconnect::FileReconnectConfig;
pub use server::{DEFAULT_API_URL, DEFAULT_WS_URL, FileServerConfig};
pub use session::FileSessionConfig;

use debate_application::SessionConfig;
use debate_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// `[output]` section. A missing format lets the command line decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<OutputFormat>,
    /// Colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP and live channel endpoints
    pub server: FileServerConfig,
    /// Submission transport and tie-break
    pub session: FileSessionConfig,
    /// Live channel reconnection
    pub reconnect: FileReconnectConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log file and transcript destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.server.validate());
        issues.extend(self.session.parse_submission().1);
        issues.extend(self.session.parse_tie_break().1);
        issues.extend(self.reconnect.validate());
        issues
    }

    /// Build the controller's settings. Unknown enum values fall back to
    /// their defaults; `validate` reports them.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_submission(self.session.parse_submission().0)
            .with_tie_break(self.session.parse_tie_break().0)
            .with_reconnect(self.reconnect.to_policy())
    }
}
