//! Debate session domain.
//!
//! - [`entities::DebateSession`]: a debate room and its two participants
//! - [`entities::Argument`]: a timestamped argument submitted to a session
//! - [`entities::DebateDraft`]: a validated creation request
//! - [`value_objects`]: identifiers, sides and presence

pub mod entities;
pub mod value_objects;
