//! Debate session value objects - identifiers and small enums.
//!
//! # Identifiers
//! - [`DebateId`] - identifier of a debate session (server-assigned)
//! - [`UserId`] - identifier of a participant
//! - [`ArgumentId`] - identifier of a submitted argument (server-assigned)
//!
//! # Enums
//! - [`Side`] - the two competing sides of a debate
//! - [`Visibility`] - public rooms vs. invite-only rooms
//! - [`ConnectionState`] - participant presence as reported by the server

use serde::{Deserialize, Serialize};

/// Unique identifier for a debate session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DebateId(String);

impl DebateId {
    /// Creates a DebateId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for DebateId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for DebateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for UserId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an argument.
///
/// Assigned by the server; the client never mints argument ids, so two
/// records with the same id are always the same argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArgumentId(String);

impl ArgumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for ArgumentId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ArgumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two sides of a debate.
///
/// The creator of a session is always side A; the second participant to
/// join becomes side B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides in their canonical order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// The opposing side.
    pub fn opponent(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Side::A),
            "B" => Ok(Side::B),
            other => Err(format!("unknown side '{}', expected A or B", other)),
        }
    }
}

/// Who may enter a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Visibility {
    /// Listed in the open-debates lobby.
    #[default]
    Public,
    /// Only reachable through its invite code.
    Private {
        #[serde(rename = "inviteCode")]
        invite_code: String,
    },
}

impl Visibility {
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private { .. })
    }

    pub fn invite_code(&self) -> Option<&str> {
        match self {
            Visibility::Public => None,
            Visibility::Private { invite_code } => Some(invite_code),
        }
    }
}

/// Presence of a participant on the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connected,
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("a".parse::<Side>().unwrap(), Side::A);
        assert_eq!(" B ".parse::<Side>().unwrap(), Side::B);
        assert!("C".parse::<Side>().is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = ArgumentId::new("arg-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"arg-1\"");
        let back: DebateId = serde_json::from_str("\"d-9\"").unwrap();
        assert_eq!(back.as_str(), "d-9");
    }

    #[test]
    fn test_visibility_invite_code() {
        let private = Visibility::Private {
            invite_code: "XK42".to_string(),
        };
        assert!(private.is_private());
        assert_eq!(private.invite_code(), Some("XK42"));
        assert_eq!(Visibility::Public.invite_code(), None);
    }
}
