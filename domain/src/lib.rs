//! Domain layer for debate-room
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A debate session pairs two participants (side A and side B) around a
//! topic. Arguments are appended by the server in timestamp order and frozen
//! once the debate is finalized.
//!
//! ## Scores and results
//!
//! - **Score normalization**: the scoring oracle's payload (number, numeric
//!   string, or multi-metric object) is reduced to one canonical value
//! - **Results aggregation**: per-side sub-scores, totals and the winner
//!
//! ## Room
//!
//! The room state machine keeps a replica of one session consistent with
//! snapshots and live events.

pub mod config;
pub mod core;
pub mod results;
pub mod room;
pub mod score;
pub mod session;

// Re-export commonly used types
pub use config::OutputFormat;
pub use core::error::ValidationError;
pub use results::{
    Metric, Outcome, RatedScore, Results, ResultsAggregator, ResultsSource, TieBreak,
};
pub use room::{Effect, FailureReason, RoomEvent, RoomPhase, RoomState, Transition, apply, transition};
pub use score::{NormalizedScore, RawScore, SourceKind, normalize};
pub use session::{
    entities::{
        Argument, ChatMessage, DebateDraft, DebateSession, OpenDebate, Participant,
        ParticipantRecord,
    },
    value_objects::{ArgumentId, ConnectionState, DebateId, Side, UserId, Visibility},
};
