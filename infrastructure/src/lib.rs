//! Infrastructure layer for debate-room
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the WebSocket live channel, the HTTP debate
//! API, configuration file loading and the JSONL session transcript.

pub mod config;
pub mod http;
pub mod live;
pub mod logging;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, FileOutputConfig, Severity};
pub use http::{HttpDebateApi, HttpError};
pub use live::{ConnectionError, SessionConnection};
pub use logging::JsonlSessionLogger;
