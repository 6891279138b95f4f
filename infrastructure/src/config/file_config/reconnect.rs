//! Live channel reconnection from TOML (`[reconnect]` section)

use super::issue::{ConfigIssue, ConfigIssueCode};
use debate_application::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw reconnect configuration from TOML
///
/// `max_attempts = 0` disables reconnection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReconnectConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for FileReconnectConfig {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            max_attempts: policy.max_attempts,
        }
    }
}

impl FileReconnectConfig {
    pub fn to_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::default()
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_multiplier(self.multiplier)
            .with_max_attempts(self.max_attempts)
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if !(self.multiplier >= 1.0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MultiplierBelowOne,
                format!("reconnect.multiplier must be >= 1.0, got {}", self.multiplier),
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MaxDelayBelowInitial,
                "reconnect.max_delay_ms is below initial_delay_ms; every attempt waits max_delay_ms",
            ));
        }
        issues
    }
}
