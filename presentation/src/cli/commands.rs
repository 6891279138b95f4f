//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results and lobby listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with per-metric breakdown
    Full,
    /// Winner and totals only
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for debate_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => debate_domain::OutputFormat::Full,
            OutputFormat::Summary => debate_domain::OutputFormat::Summary,
            OutputFormat::Json => debate_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for debate-room
#[derive(Parser, Debug)]
#[command(name = "debate-room")]
#[command(author, version, about = "Real-time debate room client")]
#[command(long_about = r#"
debate-room joins live debate sessions: two sides submit timed arguments,
an external oracle scores each one, and the session is finalized into a
winner.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./debate-room.toml  Project-level config
3. ~/.config/debate-room/config.toml   Global config
Environment variables prefixed with DEBATE_ override all files
(e.g. DEBATE_SERVER__API_URL).

Example:
  debate-room open
  debate-room create "AI will replace programmers" --duration 20
  debate-room --token $TOKEN room 6650f1c2e4
  debate-room normalize '{"clarity": 0.8, "sentiment": 0.6}'
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Bearer token for the API and the live channel
    #[arg(long, env = "DEBATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override the HTTP API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the live channel URL
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Output format (defaults to the config file, then "full")
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Enter a debate room interactively
    Room {
        /// Debate id
        debate_id: String,
    },

    /// Print the results of a debate
    Results {
        /// Debate id
        debate_id: String,
    },

    /// List public debates waiting for participants
    Open,

    /// Create a debate (you become side A)
    Create {
        /// Topic of the debate
        topic: String,

        /// Longer description shown to participants
        #[arg(short, long, default_value = "")]
        description: String,

        /// Make the debate reachable only through its invite code
        #[arg(long)]
        private: bool,

        /// Duration in minutes
        #[arg(long, default_value_t = debate_domain::session::entities::DEFAULT_DURATION_MINUTES)]
        duration: u32,
    },

    /// Join a public debate by id
    Join {
        /// Debate id
        debate_id: String,
    },

    /// Join a private debate by invite code
    JoinPrivate {
        /// Invite code
        invite_code: String,
    },

    /// Normalize a raw score payload and print the canonical value
    Normalize {
        /// Score payload as JSON (number, string or object)
        payload: String,
    },
}

impl Cli {
    /// Whether the command talks to the live channel.
    pub fn needs_live_channel(&self) -> bool {
        matches!(self.command, Some(Command::Room { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_room() {
        let cli = Cli::try_parse_from(["debate-room", "--token", "t", "room", "d1"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Room {
                debate_id: "d1".to_string()
            })
        );
        assert_eq!(cli.token.as_deref(), Some("t"));
        assert!(cli.needs_live_channel());
    }

    #[test]
    fn test_parse_create_defaults() {
        let cli = Cli::try_parse_from(["debate-room", "create", "AI vs Humans"]).unwrap();
        match cli.command {
            Some(Command::Create {
                topic,
                description,
                private,
                duration,
            }) => {
                assert_eq!(topic, "AI vs Humans");
                assert!(description.is_empty());
                assert!(!private);
                assert_eq!(
                    duration,
                    debate_domain::session::entities::DEFAULT_DURATION_MINUTES
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_verbosity_after_subcommand() {
        let cli = Cli::try_parse_from(["debate-room", "open", "-vv", "-q"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        assert!(!cli.needs_live_channel());
    }

    #[test]
    fn test_output_format_maps_to_domain() {
        let cli = Cli::try_parse_from(["debate-room", "-o", "summary", "results", "d1"]).unwrap();
        let format: debate_domain::OutputFormat = cli.output.unwrap().into();
        assert_eq!(format, debate_domain::OutputFormat::Summary);
    }

    #[test]
    fn test_show_config_without_subcommand() {
        let cli = Cli::try_parse_from(["debate-room", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
