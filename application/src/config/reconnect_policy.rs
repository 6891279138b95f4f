//! Reconnect policy: bounded exponential backoff for the live channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the live channel retries after an unexpected drop.
///
/// Attempt `n` (1-based) waits `initial_delay * multiplier^(n-1)`, capped at
/// `max_delay`. `max_attempts == 0` disables reconnection. A manual
/// disconnect and an auth failure never trigger it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_attempts: 8,
        }
    }
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before the given attempt, or `None` when attempts are exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi(attempt as i32 - 1);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(capped as u64))
    }

    // ==================== Builder Methods ====================

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (1..=8)
            .map(|n| policy.delay_for(n).unwrap().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 10000, 10000, 10000]);
        assert_eq!(policy.delay_for(9), None);
        assert_eq!(policy.delay_for(0), None);
    }

    #[test]
    fn test_disabled_policy() {
        let policy = ReconnectPolicy::disabled();
        assert!(!policy.is_enabled());
        assert_eq!(policy.delay_for(1), None);
    }

    #[test]
    fn test_sub_unit_multiplier_is_treated_as_constant() {
        let policy = ReconnectPolicy::default().with_multiplier(0.5);
        assert_eq!(policy.delay_for(3), Some(Duration::from_millis(500)));
    }
}
