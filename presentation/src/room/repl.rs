//! Interactive room REPL
//!
//! Reads commands from stdin while printing live room changes as they are
//! published by the session controller.

use super::feed::{self, FeedItem};
use crate::output::ConsoleFormatter;
use crate::progress::ProgressSpinner;
use colored::Colorize;
use debate_application::{DebateApi, LiveChannel, SessionController, SessionError};
use debate_domain::{DebateId, OutputFormat, RoomPhase, RoomState};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::warn;

/// How long to wait for the first room baseline before handing control to the user.
const JOIN_TIMEOUT: Duration = Duration::from_secs(15);

/// A line typed in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    Submit(String),
    Finalize,
    Chat(String),
    Typing,
    Refresh,
    Results,
    Show,
    Leave,
    Quit,
    Help,
    Unknown(String),
}

impl RoomCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(RoomCommand::Submit(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let command = match name.to_ascii_lowercase().as_str() {
            "finalize" => RoomCommand::Finalize,
            "chat" | "c" if !arg.is_empty() => RoomCommand::Chat(arg.to_string()),
            "typing" | "t" => RoomCommand::Typing,
            "refresh" | "r" => RoomCommand::Refresh,
            "results" => RoomCommand::Results,
            "show" | "state" => RoomCommand::Show,
            "leave" => RoomCommand::Leave,
            "quit" | "exit" | "q" => RoomCommand::Quit,
            "help" | "h" | "?" => RoomCommand::Help,
            _ => RoomCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Interactive session against one debate room
pub struct RoomRepl<'a, C: LiveChannel + 'static, A: DebateApi + 'static> {
    controller: &'a SessionController<C, A>,
    format: OutputFormat,
    show_progress: bool,
    typing: bool,
}

impl<'a, C: LiveChannel + 'static, A: DebateApi + 'static> RoomRepl<'a, C, A> {
    pub fn new(controller: &'a SessionController<C, A>) -> Self {
        Self {
            controller,
            format: OutputFormat::Full,
            show_progress: true,
            typing: false,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Join the room and run until the user quits or stdin closes.
    pub async fn run(&mut self, debate_id: DebateId) -> Result<(), SessionError> {
        let mut states = self.controller.subscribe();
        let mut spinner = ProgressSpinner::new(self.show_progress);

        spinner.start("Room", format!("Joining {}...", debate_id));
        self.controller.join(debate_id.clone()).await?;
        let mut prev = match tokio::time::timeout(JOIN_TIMEOUT, Self::baseline(&mut states)).await
        {
            Ok(Some(state)) => {
                match &state.last_failure {
                    Some(failure) if !state.has_baseline => spinner.fail(&failure.to_string()),
                    _ => spinner.succeed("Joined"),
                }
                state
            }
            Ok(None) => return Err(SessionError::Stopped),
            Err(_) => {
                spinner.fail("No room state yet; waiting for live updates");
                self.controller.state()
            }
        };

        self.print_welcome(&prev);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = states.borrow_and_update().clone();
                    self.render_changes(&prev, &next, &mut spinner);
                    prev = next;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let Some(command) = RoomCommand::parse(&line) else {
                                continue;
                            };
                            if let Flow::Exit = self.execute(command, &spinner).await {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Failed to read stdin: {}", e);
                            break;
                        }
                    }
                }
            }
        }

        spinner.clear();
        if self.controller.state().debate_id.is_some() {
            self.controller.leave().await?;
        }
        println!("Bye!");
        Ok(())
    }

    /// Wait until the room has a baseline or a failure to report.
    async fn baseline(states: &mut watch::Receiver<RoomState>) -> Option<RoomState> {
        loop {
            {
                let state = states.borrow_and_update();
                if state.has_baseline || state.last_failure.is_some() {
                    return Some(state.clone());
                }
            }
            states.changed().await.ok()?;
        }
    }

    fn print_welcome(&self, state: &RoomState) {
        println!();
        println!("{}", ConsoleFormatter::format_room(state));
        println!(
            "{}",
            "Type an argument and press Enter to submit it. /help lists commands.".dimmed()
        );
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  <text>            - Submit an argument");
        println!("  /finalize         - Finalize the debate and compute results");
        println!("  /chat <text>, /c  - Send a chat message");
        println!("  /typing, /t       - Toggle the typing indicator");
        println!("  /refresh, /r      - Re-fetch the room from the server");
        println!("  /results          - Show the results");
        println!("  /show             - Reprint the room");
        println!("  /leave            - Leave the room and exit");
        println!("  /quit, /exit, /q  - Exit");
        println!();
    }

    fn render_changes(&self, prev: &RoomState, next: &RoomState, spinner: &mut ProgressSpinner) {
        if prev.phase != RoomPhase::Finalizing && next.phase == RoomPhase::Finalizing {
            spinner.start("Room", "Finalizing...");
        } else if prev.phase == RoomPhase::Finalizing && next.phase != RoomPhase::Finalizing {
            if next.phase == RoomPhase::Finalized {
                spinner.succeed("Finalized");
            } else {
                spinner.clear();
            }
        }

        for item in feed::diff(prev, next) {
            // Phase changes are shown through the spinner.
            if matches!(item, FeedItem::Phase(_)) {
                continue;
            }
            spinner.println(&item.render(next.session.as_ref(), self.format));
        }
    }

    async fn execute(&mut self, command: RoomCommand, spinner: &ProgressSpinner) -> Flow {
        let result = match command {
            RoomCommand::Submit(content) => {
                if self.typing {
                    self.typing = false;
                    let _ = self.controller.set_typing(false).await;
                }
                self.controller.submit(content).await
            }
            RoomCommand::Finalize => self.controller.finalize().await,
            RoomCommand::Chat(message) => self.controller.send_chat(message).await,
            RoomCommand::Typing => {
                self.typing = !self.typing;
                self.controller.set_typing(self.typing).await
            }
            RoomCommand::Refresh => self.controller.refresh().await,
            RoomCommand::Results => {
                let state = self.controller.state();
                match &state.results {
                    Some(results) => {
                        spinner.println(&ConsoleFormatter::format_results(results, self.format));
                        Ok(())
                    }
                    None => self.controller.fetch_results().await,
                }
            }
            RoomCommand::Show => {
                spinner.println(&ConsoleFormatter::format_room(&self.controller.state()));
                Ok(())
            }
            RoomCommand::Leave => {
                let left = self.controller.leave().await;
                if left.is_ok() {
                    println!("Left the debate.");
                }
                return match left {
                    Ok(()) => Flow::Exit,
                    Err(e) => {
                        Self::print_error(spinner, &e);
                        Flow::Continue
                    }
                };
            }
            RoomCommand::Quit => return Flow::Exit,
            RoomCommand::Help => {
                Self::print_help();
                Ok(())
            }
            RoomCommand::Unknown(cmd) => {
                spinner.println(&format!("Unknown command: {}", cmd));
                spinner.println("Type /help for available commands");
                Ok(())
            }
        };

        match result {
            Ok(()) => Flow::Continue,
            Err(SessionError::Stopped) => Flow::Exit,
            Err(e) => {
                Self::print_error(spinner, &e);
                Flow::Continue
            }
        }
    }

    fn print_error(spinner: &ProgressSpinner, error: &SessionError) {
        spinner.println(&format!("{} {}", "Error:".red().bold(), error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_submits() {
        assert_eq!(
            RoomCommand::parse("  AI cannot feel empathy  "),
            Some(RoomCommand::Submit("AI cannot feel empathy".to_string()))
        );
        assert_eq!(RoomCommand::parse("   "), None);
    }

    #[test]
    fn test_commands() {
        assert_eq!(RoomCommand::parse("/finalize"), Some(RoomCommand::Finalize));
        assert_eq!(RoomCommand::parse("/FINALIZE"), Some(RoomCommand::Finalize));
        assert_eq!(RoomCommand::parse("/t"), Some(RoomCommand::Typing));
        assert_eq!(RoomCommand::parse("/refresh"), Some(RoomCommand::Refresh));
        assert_eq!(RoomCommand::parse("/results"), Some(RoomCommand::Results));
        assert_eq!(RoomCommand::parse("/leave"), Some(RoomCommand::Leave));
        assert_eq!(RoomCommand::parse("/exit"), Some(RoomCommand::Quit));
        assert_eq!(RoomCommand::parse("/?"), Some(RoomCommand::Help));
    }

    #[test]
    fn test_chat_requires_text() {
        assert_eq!(
            RoomCommand::parse("/chat  good point "),
            Some(RoomCommand::Chat("good point".to_string()))
        );
        assert_eq!(
            RoomCommand::parse("/chat"),
            Some(RoomCommand::Unknown("/chat".to_string()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            RoomCommand::parse("/dance now"),
            Some(RoomCommand::Unknown("/dance now".to_string()))
        );
    }
}
