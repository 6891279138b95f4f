//! Debate session entities
//!
//! All entities (de)serialize as camelCase JSON. Deserialization also accepts
//! the field names used by the debate backend (`_id`, `isFinalized`,
//! `joinedUsers`, `score`, ...) so that snapshot and live payloads decode
//! straight into these types.

use super::value_objects::{ArgumentId, ConnectionState, DebateId, Side, UserId, Visibility};
use crate::core::error::ValidationError;
use crate::score::RawScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of participants in a session (one per side).
pub const MAX_PARTICIPANTS: usize = 2;

/// Minimum topic length (in characters, after trimming) for a new session.
pub const MIN_TOPIC_CHARS: usize = 5;

/// Minimum session duration in minutes.
pub const MIN_DURATION_MINUTES: u32 = 10;

/// Duration used when a creation request does not specify one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// A participant bound to a side (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: UserId,
    pub display_name: String,
    pub side: Side,
    #[serde(default)]
    pub connection_state: ConnectionState,
}

/// A participant as announced by the server, before a side is known.
///
/// `user-joined` payloads and `joinedUsers` lists do not always carry a
/// side; the side is then derived from join order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    #[serde(alias = "_id", alias = "id")]
    pub user_id: UserId,
    #[serde(default, alias = "username", alias = "email")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub connection_state: ConnectionState,
}

impl ParticipantRecord {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            side: None,
            connection_state: ConnectionState::Connected,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Bind this record to a side.
    pub fn into_participant(self, side: Side) -> Participant {
        let display_name = self
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.user_id.to_string());
        Participant {
            user_id: self.user_id,
            display_name,
            side,
            connection_state: self.connection_state,
        }
    }
}

impl From<Participant> for ParticipantRecord {
    fn from(p: Participant) -> Self {
        Self {
            user_id: p.user_id,
            display_name: Some(p.display_name),
            side: Some(p.side),
            connection_state: p.connection_state,
        }
    }
}

/// A debate session (Entity)
///
/// Created by a creation request (creator = side A), joined by a second
/// participant (side B), appended to by argument submission and frozen by
/// finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SessionRecord", into = "SessionRecord")]
pub struct DebateSession {
    pub id: DebateId,
    pub topic: String,
    pub description: String,
    pub visibility: Visibility,
    pub duration_minutes: u32,
    /// Ordered by join time, at most [`MAX_PARTICIPANTS`].
    pub participants: Vec<Participant>,
    pub finalized: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl DebateSession {
    pub fn new(id: impl Into<DebateId>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            description: String::new(),
            visibility: Visibility::Public,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            participants: Vec::new(),
            finalized: false,
            created_at: None,
        }
    }

    /// Side of the given user, if they participate.
    pub fn side_of(&self, user_id: &UserId) -> Option<Side> {
        self.participant(user_id).map(|p| p.side)
    }

    pub fn participant(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.user_id == user_id)
    }

    /// Participant holding the given side.
    pub fn participant_on(&self, side: Side) -> Option<&Participant> {
        self.participants.iter().find(|p| p.side == side)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }

    /// Seat a participant.
    ///
    /// A user already seated keeps their side (the side mapping never changes
    /// for the lifetime of the session); only presence and display name are
    /// refreshed. A new user takes the requested side when it is free,
    /// otherwise the first free side. Returns `None` when the room is full.
    pub fn seat(&mut self, record: ParticipantRecord) -> Option<Side> {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == record.user_id)
        {
            existing.connection_state = record.connection_state;
            if let Some(name) = record.display_name.filter(|n| !n.trim().is_empty()) {
                existing.display_name = name;
            }
            return Some(existing.side);
        }

        if self.is_full() {
            return None;
        }

        let taken: Vec<Side> = self.participants.iter().map(|p| p.side).collect();
        let side = record
            .side
            .filter(|s| !taken.contains(s))
            .or_else(|| Side::ALL.into_iter().find(|s| !taken.contains(s)))?;

        self.participants.push(record.into_participant(side));
        Some(side)
    }

    /// Mark a participant as present or absent.
    pub fn set_presence(&mut self, user_id: &UserId, state: ConnectionState) -> bool {
        match self.participants.iter_mut().find(|p| &p.user_id == user_id) {
            Some(p) if p.connection_state != state => {
                p.connection_state = state;
                true
            }
            _ => false,
        }
    }
}

/// Wire shape of a session, tolerant of the backend's field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    #[serde(default = "empty_debate_id", alias = "_id")]
    id: DebateId,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invite_code: Option<String>,
    #[serde(default = "default_duration", alias = "duration")]
    duration_minutes: u32,
    #[serde(default, alias = "joinedUsers")]
    participants: Vec<ParticipantRecord>,
    #[serde(default, alias = "isFinalized")]
    finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

impl From<SessionRecord> for DebateSession {
    fn from(record: SessionRecord) -> Self {
        let visibility = match (record.is_private, record.invite_code) {
            (true, Some(invite_code)) => Visibility::Private { invite_code },
            (true, None) => Visibility::Private {
                invite_code: String::new(),
            },
            (false, _) => Visibility::Public,
        };

        let mut session = DebateSession {
            id: record.id,
            topic: record.topic,
            description: record.description,
            visibility,
            duration_minutes: record.duration_minutes,
            participants: Vec::new(),
            finalized: record.finalized,
            created_at: record.created_at,
        };
        // Join order decides the side when the record does not say.
        for participant in record.participants {
            session.seat(participant);
        }
        session
    }
}

impl From<DebateSession> for SessionRecord {
    fn from(session: DebateSession) -> Self {
        let is_private = session.visibility.is_private();
        let invite_code = session.visibility.invite_code().map(str::to_string);
        SessionRecord {
            id: session.id,
            topic: session.topic,
            description: session.description,
            is_private,
            invite_code,
            duration_minutes: session.duration_minutes,
            participants: session
                .participants
                .into_iter()
                .map(ParticipantRecord::from)
                .collect(),
            finalized: session.finalized,
            created_at: session.created_at,
        }
    }
}

/// A submitted argument (Entity)
///
/// `submitted_at` is assigned by the server. The client never fabricates an
/// argument record; it only learns about arguments from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(alias = "_id")]
    pub id: ArgumentId,
    /// Empty when the payload did not name its session.
    #[serde(default = "empty_debate_id", alias = "debateId", alias = "debate")]
    pub session_id: DebateId,
    #[serde(alias = "userId", alias = "user")]
    pub author_id: UserId,
    #[serde(default, alias = "username", alias = "email", skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub content: String,
    #[serde(alias = "createdAt")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default, alias = "score")]
    pub raw_score: RawScore,
}

fn empty_debate_id() -> DebateId {
    DebateId::new("")
}

impl Argument {
    pub fn new(
        id: impl Into<ArgumentId>,
        session_id: impl Into<DebateId>,
        author_id: impl Into<UserId>,
        content: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            author_id: author_id.into(),
            author_name: None,
            content: content.into(),
            submitted_at,
            raw_score: RawScore::Unknown,
        }
    }

    pub fn with_score(mut self, raw_score: RawScore) -> Self {
        self.raw_score = raw_score;
        self
    }

    /// Whether the argument belongs to the given session.
    ///
    /// Payloads without a session id are attributed to the session of interest.
    pub fn belongs_to(&self, debate_id: &DebateId) -> bool {
        self.session_id.as_str().is_empty() || &self.session_id == debate_id
    }

    /// Whether the scoring oracle has not produced a score yet.
    pub fn is_score_pending(&self) -> bool {
        self.raw_score.is_unknown()
    }
}

/// A chat message exchanged in a room (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message id.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "empty_debate_id", alias = "debate")]
    pub debate_id: DebateId,
    #[serde(alias = "user")]
    pub user_id: UserId,
    #[serde(default, alias = "username", alias = "email", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(alias = "text", alias = "content")]
    pub message: String,
    #[serde(default, alias = "timestamp", alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// A request to create a new session (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateDraft {
    pub topic: String,
    pub description: String,
    pub is_private: bool,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
}

impl DebateDraft {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into().trim().to_string(),
            description: String::new(),
            is_private: false,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Check the request before it leaves the client.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let chars = self.topic.trim().chars().count();
        if chars == 0 {
            return Err(ValidationError::EmptyTopic);
        }
        if chars < MIN_TOPIC_CHARS {
            return Err(ValidationError::TopicTooShort {
                min: MIN_TOPIC_CHARS,
                actual: chars,
            });
        }
        if self.duration_minutes < MIN_DURATION_MINUTES {
            return Err(ValidationError::DurationTooShort {
                min: MIN_DURATION_MINUTES,
                actual: self.duration_minutes,
            });
        }
        Ok(())
    }
}

/// An entry of the open-debates lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDebate {
    #[serde(flatten)]
    pub session: DebateSession,
    #[serde(default = "default_max_users")]
    pub max_users: usize,
}

fn default_max_users() -> usize {
    MAX_PARTICIPANTS
}

impl OpenDebate {
    pub fn seats_left(&self) -> usize {
        self.max_users
            .saturating_sub(self.session.participants.len())
    }
}
