//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ValidationError`]: input rejected before reaching the network

pub mod error;
