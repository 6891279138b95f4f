//! Application layer for debate-room
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ReconnectPolicy, SessionConfig, SubmissionTransport};
pub use ports::{
    debate_api::{ApiError, DebateApi},
    live_channel::{
        ChannelError, EventHandler, EventName, HandlerId, HandlerRegistry, InboundEvent,
        LiveChannel, OutboundCommand,
    },
    session_logger::{NoSessionLogger, SessionLogger, TranscriptEntry},
};
pub use use_cases::lobby::{LobbyError, LobbyUseCase};
pub use use_cases::session_controller::{SessionController, SessionError};
