//! Logging infrastructure: the structured session transcript.
//!
//! Provides [`JsonlSessionLogger`], a JSONL file writer that implements
//! the [`SessionLogger`](debate_application::SessionLogger) port.

mod jsonl_transcript;

pub use jsonl_transcript::JsonlSessionLogger;
