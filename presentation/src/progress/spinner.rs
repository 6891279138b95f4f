//! Spinner shown while waiting on the server

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A single indicatif spinner that can be restarted.
///
/// Disabled spinners (`--quiet`) still print lines, so callers can route all
/// room output through [`ProgressSpinner::println`].
pub struct ProgressSpinner {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressSpinner {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Start spinning with a message, replacing any running spinner.
    pub fn start(&mut self, prefix: &str, message: impl Into<String>) {
        self.clear();
        if !self.enabled {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.set_prefix(prefix.to_string());
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(pb);
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    pub fn succeed(&mut self, message: &str) {
        self.finish(format!("{} {}", "✓".green(), message));
    }

    pub fn fail(&mut self, message: &str) {
        self.finish(format!("{} {}", "✗".red(), message.red()));
    }

    fn finish(&mut self, line: String) {
        match self.bar.take() {
            Some(pb) => {
                pb.finish_and_clear();
                println!("{}", line);
            }
            None if self.enabled => println!("{}", line),
            None => {}
        }
    }

    /// Stop without printing anything.
    pub fn clear(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a line without tearing the spinner.
    pub fn println(&self, line: &str) {
        match &self.bar {
            Some(pb) => pb.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_never_activates() {
        let mut spinner = ProgressSpinner::new(false);
        spinner.start("Room", "Joining...");
        assert!(!spinner.is_active());
        spinner.succeed("joined");
        assert!(!spinner.is_active());
    }

    #[test]
    fn test_restart_and_clear() {
        let mut spinner = ProgressSpinner::new(true);
        spinner.start("Room", "Joining...");
        assert!(spinner.is_active());
        spinner.start("Room", "Finalizing...");
        assert!(spinner.is_active());
        spinner.clear();
        assert!(!spinner.is_active());
    }
}
