//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod lobby;
pub mod session_controller;
