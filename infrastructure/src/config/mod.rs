//! Configuration file loading for debate-room
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DEBATE_` environment variables (`DEBATE_SERVER__API_URL=...`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./debate-room.toml` or `./.debate-room.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/debate-room/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigIssueCode, DEFAULT_API_URL, DEFAULT_WS_URL, FileConfig, FileLoggingConfig,
    FileOutputConfig, FileReconnectConfig, FileServerConfig, FileSessionConfig,
    Severity,
};
pub use loader::ConfigLoader;
