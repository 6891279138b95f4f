//! Server endpoints from TOML (`[server]` section)

use super::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:5000/ws";

/// Raw server configuration from TOML
///
/// ```toml
/// [server]
/// api_url = "https://debates.example.com/api"
/// ws_url = "wss://debates.example.com/ws"
/// request_timeout_secs = 15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Base URL for point-in-time HTTP calls
    pub api_url: String,
    /// URL of the live channel
    pub ws_url: String,
    /// Per-request timeout for HTTP calls
    pub request_timeout_secs: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl FileServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        check_url(&mut issues, "server.api_url", &self.api_url, &["http://", "https://"]);
        check_url(&mut issues, "server.ws_url", &self.ws_url, &["ws://", "wss://"]);
        if self.request_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "server.request_timeout_secs cannot be 0",
            ));
        }
        issues
    }
}

fn check_url(issues: &mut Vec<ConfigIssue>, field: &str, value: &str, schemes: &[&str]) {
    let value = value.trim();
    if value.is_empty() {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::EmptyUrl {
                field: field.to_string(),
            },
            format!("{} cannot be empty", field),
        ));
    } else if !schemes.iter().any(|s| value.starts_with(s)) {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::InvalidUrlScheme {
                field: field.to_string(),
                value: value.to_string(),
            },
            format!("{} must start with {}", field, schemes.join(" or ")),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FileServerConfig::default().validate().is_empty());
    }

    #[test]
    fn test_scheme_mismatch() {
        let config = FileServerConfig {
            ws_url: "http://localhost:5000".to_string(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0].code,
            ConfigIssueCode::InvalidUrlScheme { field, .. } if field == "server.ws_url"
        ));
    }
}
