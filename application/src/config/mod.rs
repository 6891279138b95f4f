//! Application-level configuration.
//!
//! - [`SessionConfig`]: submission transport and tie-break rule
//! - [`ReconnectPolicy`]: live channel backoff

pub mod reconnect_policy;
pub mod session_config;

pub use reconnect_policy::ReconnectPolicy;
pub use session_config::{SessionConfig, SubmissionTransport};
