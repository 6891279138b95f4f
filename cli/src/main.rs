//! CLI entrypoint for debate-room
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use debate_application::{
    LobbyUseCase, NoSessionLogger, SessionController, SessionLogger,
};
use debate_domain::{DebateDraft, DebateId, RawScore, normalize};
use debate_infrastructure::{
    ConfigLoader, FileConfig, HttpDebateApi, JsonlSessionLogger, SessionConnection,
};
use debate_presentation::{Cli, Command, ConsoleFormatter, OutputConfig, RoomRepl};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// File name prefix of the rolling operation log.
const LOG_FILE_NAME: &str = "debate-room.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.file_dir());
    info!("Starting debate-room");

    if let Some(url) = &cli.api_url {
        config.server.api_url = url.clone();
    }
    if let Some(url) = &cli.ws_url {
        config.server.ws_url = url.clone();
    }
    check_config(&config)?;

    let output = OutputConfig::resolve(
        cli.output.map(Into::into),
        config.output.format,
        config.output.color,
        cli.quiet,
    );
    output.apply_color();

    let Some(command) = cli.command.clone() else {
        bail!("No command given. Run with --help for usage.");
    };

    // === Dependency Injection ===
    let api = Arc::new(
        HttpDebateApi::new(
            config.server.api_url.clone(),
            cli.token.clone(),
            config.server.request_timeout(),
        )
        .context("Failed to build the HTTP client")?,
    );
    let lobby = LobbyUseCase::new(Arc::clone(&api));

    match command {
        Command::Open => {
            let debates = lobby.open_debates().await?;
            println!("{}", ConsoleFormatter::format_open_debates(&debates, output.format).trim_end());
        }
        Command::Create {
            topic,
            description,
            private,
            duration,
        } => {
            let mut draft = DebateDraft::new(topic)
                .with_description(description)
                .with_duration(duration);
            if private {
                draft = draft.private();
            }
            let session = lobby.create(draft).await?;
            println!("{}", ConsoleFormatter::format_session(&session, output.format).trim_end());
        }
        Command::Join { debate_id } => {
            let session = lobby.join(&DebateId::new(debate_id)).await?;
            println!("{}", ConsoleFormatter::format_session(&session, output.format).trim_end());
        }
        Command::JoinPrivate { invite_code } => {
            let session = lobby.join_private(&invite_code).await?;
            println!("{}", ConsoleFormatter::format_session(&session, output.format).trim_end());
        }
        Command::Results { debate_id } => {
            let results = lobby.results(&DebateId::new(debate_id)).await?;
            println!("{}", ConsoleFormatter::format_results(&results, output.format).trim_end());
        }
        Command::Room { debate_id } => {
            let debate_id = DebateId::new(debate_id);
            let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) else {
                bail!("A token is required to enter a room. Use --token or DEBATE_TOKEN.");
            };

            let session_config = config.session_config();
            let channel = Arc::new(SessionConnection::new(
                config.server.ws_url.clone(),
                session_config.reconnect.clone(),
            ));
            let logger: Arc<dyn SessionLogger> = match config
                .logging
                .transcript_path()
                .and_then(JsonlSessionLogger::open)
            {
                Some(logger) => Arc::new(logger.for_debate(debate_id.clone())),
                None => Arc::new(NoSessionLogger),
            };

            let controller =
                SessionController::with_logger(channel, Arc::clone(&api), session_config, logger);
            controller
                .connect(token)
                .await
                .context("Failed to connect to the live channel")?;

            let outcome = RoomRepl::new(&controller)
                .with_format(output.format)
                .with_progress(output.show_progress)
                .run(debate_id)
                .await;

            controller.disconnect().await;
            controller.shutdown().await;
            outcome?;
        }
        Command::Normalize { payload } => {
            // Anything that is not JSON is taken as a string payload.
            let value = serde_json::from_str(&payload)
                .unwrap_or(serde_json::Value::String(payload));
            let score = normalize(&RawScore::from(value));
            println!("{}", ConsoleFormatter::format_normalized(&score, output.format).trim_end());
        }
    }

    Ok(())
}

/// Install the tracing subscriber: stderr always, plus a daily rolling file
/// when a log directory is configured. The guard must live until exit.
fn init_logging(verbose: u8, file_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}

/// Log warnings and refuse to start on errors.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    let mut errors = Vec::new();
    for issue in &issues {
        if issue.is_error() {
            errors.push(issue.to_string());
        } else {
            warn!("{}", issue);
        }
    }
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}
