//! Authfront CLI - session client for the authfront auth API

mod commands;
mod logging;
mod shell;

use anyhow::{Context, Result};
use authfront_core::{ClientConfig, FileStorage, MemoryStorage, SessionController, Storage};
use authfront_http::HttpTransport;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use tracing::{Level, debug, error, info};

#[derive(Parser)]
#[command(name = "authfront")]
#[command(about = "Log in, keep a session and manage your profile against the authfront API")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true, env = "AUTHFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the auth API (overrides the configuration)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding the stored session and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Keep the session in memory only; nothing is written to the data directory
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = apply_overrides(config, cli.base_url, cli.data_dir)?;

    logging::init_logging(
        cli.log_level.into(),
        &config.data_dir,
        cli.no_file_log || cli.ephemeral,
    )?;

    info!("Starting authfront CLI against {}", config.api.base_url);

    let result = if cli.ephemeral {
        run(cli.command, &config, MemoryStorage::new()).await
    } else {
        run(cli.command, &config, FileStorage::in_dir(&config.data_dir)).await
    };

    match result {
        Ok(()) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Apply command-line overrides and check the result again
fn apply_overrides(
    mut config: ClientConfig,
    base_url: Option<String>,
    data_dir: Option<PathBuf>,
) -> Result<ClientConfig> {
    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    config.validate().context("Invalid command-line override")?;
    Ok(config)
}

async fn run<S: Storage + 'static>(
    command: Commands,
    config: &ClientConfig,
    storage: S,
) -> Result<()> {
    let transport = HttpTransport::from_config(&config.api)?;
    let controller = SessionController::new(transport, storage)
        .with_idle_timeout(config.session.idle_timeout());

    command.execute(&controller).await
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
