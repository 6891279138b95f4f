//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod debate_api;
pub mod live_channel;
pub mod session_logger;
