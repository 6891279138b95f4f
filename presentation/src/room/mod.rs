//! Debate room: live feed rendering and the interactive REPL.

pub mod feed;
pub mod repl;

pub use feed::FeedItem;
pub use repl::{RoomCommand, RoomRepl};
