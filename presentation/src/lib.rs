//! Presentation layer for debate-room
//!
//! This crate contains CLI definitions, output formatters,
//! the progress spinner and the interactive room REPL.

pub mod cli;
pub mod config;
pub mod output;
pub mod progress;
pub mod room;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use config::OutputConfig;
pub use output::console::ConsoleFormatter;
pub use progress::ProgressSpinner;
pub use room::{FeedItem, RoomCommand, RoomRepl};
