//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// Empty strings mean "disabled".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the daily-rolling operation log
    pub file_dir: String,
    /// Path of the JSONL session transcript
    pub transcript: String,
}

impl FileLoggingConfig {
    pub fn file_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.file_dir)
    }

    pub fn transcript_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.transcript)
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(rest) = value.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Some(home.join(rest));
    }
    Some(PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_means_disabled() {
        let config = FileLoggingConfig::default();
        assert!(config.file_dir().is_none());
        assert!(config.transcript_path().is_none());

        let config = FileLoggingConfig {
            transcript: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.transcript_path().is_none());
    }

    #[test]
    fn test_plain_path() {
        let config = FileLoggingConfig {
            file_dir: "/var/log/debate-room".to_string(),
            ..Default::default()
        };
        assert_eq!(config.file_dir(), Some(PathBuf::from("/var/log/debate-room")));
    }
}
