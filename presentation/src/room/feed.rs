//! Room feed: what changed between two published room states.

use crate::output::ConsoleFormatter;
use colored::Colorize;
use debate_domain::{
    Argument, ChatMessage, ConnectionState, DebateSession, FailureReason, OutputFormat,
    Participant, Results, RoomPhase, RoomState, UserId,
};

/// One printable change in the room.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Connection(ConnectionState),
    Phase(RoomPhase),
    Joined(Participant),
    Presence(Participant),
    ArgumentAdded(Argument),
    ScoreArrived(Argument),
    Typing(UserId),
    Chat(ChatMessage),
    Results(Results),
    Failure(FailureReason),
}

/// Changes from `prev` to `next`, in display order.
///
/// When the session of interest changed, `next` is compared against an empty
/// room so everything it holds is reported.
pub fn diff(prev: &RoomState, next: &RoomState) -> Vec<FeedItem> {
    let empty;
    let prev = if prev.debate_id == next.debate_id {
        prev
    } else {
        empty = RoomState::new(next.tie_break);
        &empty
    };

    let mut items = Vec::new();

    if prev.connection != next.connection {
        items.push(FeedItem::Connection(next.connection));
    }
    if prev.phase != next.phase {
        items.push(FeedItem::Phase(next.phase));
    }

    if let Some(session) = &next.session {
        for participant in &session.participants {
            match prev
                .session
                .as_ref()
                .and_then(|s| s.participant(&participant.user_id))
            {
                None => items.push(FeedItem::Joined(participant.clone())),
                Some(before) if before.connection_state != participant.connection_state => {
                    items.push(FeedItem::Presence(participant.clone()))
                }
                Some(_) => {}
            }
        }
    }

    for argument in next.arguments() {
        match prev.argument(&argument.id) {
            None => items.push(FeedItem::ArgumentAdded(argument.clone())),
            Some(before) if before.is_score_pending() && !argument.is_score_pending() => {
                items.push(FeedItem::ScoreArrived(argument.clone()))
            }
            Some(_) => {}
        }
    }

    for user in next.typing.difference(&prev.typing) {
        items.push(FeedItem::Typing(user.clone()));
    }

    if next.chat.len() > prev.chat.len() {
        items.extend(
            next.chat[prev.chat.len()..]
                .iter()
                .cloned()
                .map(FeedItem::Chat),
        );
    }

    if let Some(results) = &next.results
        && prev.results.as_ref() != Some(results)
    {
        items.push(FeedItem::Results(results.clone()));
    }

    if let Some(failure) = &next.last_failure
        && prev.last_failure.as_ref() != Some(failure)
    {
        items.push(FeedItem::Failure(failure.clone()));
    }

    items
}

impl FeedItem {
    /// Render for the console. Results use the requested output format.
    pub fn render(&self, session: Option<&DebateSession>, format: OutputFormat) -> String {
        match self {
            FeedItem::Connection(ConnectionState::Connected) => {
                format!("{} {}", "●".green(), "Connected".green())
            }
            FeedItem::Connection(ConnectionState::Disconnected) => {
                format!("{} {}", "●".red(), "Disconnected, reconnecting...".red())
            }
            FeedItem::Phase(phase) => format!("{} {}", "Phase:".dimmed(), phase.to_string().bold()),
            FeedItem::Joined(p) => format!(
                "{} {} joined as side {}",
                "→".blue(),
                p.display_name.bold(),
                p.side
            ),
            FeedItem::Presence(p) => match p.connection_state {
                ConnectionState::Connected => {
                    format!("{} {} is back", "→".blue(), p.display_name.bold())
                }
                ConnectionState::Disconnected => {
                    format!("{} {} left", "←".yellow(), p.display_name.bold())
                }
            },
            FeedItem::ArgumentAdded(argument) => ConsoleFormatter::format_argument(argument, session),
            FeedItem::ScoreArrived(argument) => format!(
                "{} {}",
                "scored".dimmed(),
                ConsoleFormatter::format_argument(argument, session)
            ),
            FeedItem::Typing(user) => {
                let name = session
                    .and_then(|s| s.participant(user))
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| user.to_string());
                format!("{}", format!("{} is typing...", name).dimmed().italic())
            }
            FeedItem::Chat(message) => {
                let name = message
                    .display_name
                    .clone()
                    .unwrap_or_else(|| message.user_id.to_string());
                format!("{} {}: {}", "[chat]".cyan(), name.bold(), message.message)
            }
            FeedItem::Results(results) => ConsoleFormatter::format_results(results, format),
            FeedItem::Failure(failure) => format!("{} {}", "Error:".red().bold(), failure),
        }
    }
}
