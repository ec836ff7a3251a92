//! `safelatch` - biometric enclosure access controller.
//!
//! # Commands
//!
//! - `run`: start the controller loops until Ctrl+C or SIGTERM
//! - `identities`: list the names in the identity store

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use safelatch_core::ControllerConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod devices;

#[derive(Parser, Debug)]
#[command(name = "safelatch")]
#[command(about = "Biometric enclosure access controller")]
#[command(version, propagate_version = true)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(short, long, global = true, env = "SAFELATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `safelatch_controller=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Identity database file. Overrides `storage.database_path`.
    #[arg(long, global = true, env = "SAFELATCH_DATABASE")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the access controller
    Run(RunArgs),

    /// List the identities in the store
    Identities,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Telegram bot token. Overrides `notifier.bot_token`.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Telegram chat id. Overrides `notifier.chat_id`.
    #[arg(long, env = "CHAT_ID")]
    chat_id: Option<String>,

    /// Face encoder endpoint. Overrides `recognition.encoder_url`.
    #[arg(long, env = "SAFELATCH_ENCODER_URL")]
    encoder_url: Option<String>,

    /// Log notifications instead of sending them.
    #[arg(long)]
    no_notify: bool,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Load the configuration file (or defaults) and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ControllerConfig::default(),
    };

    if let Some(database) = &cli.database {
        config.storage.database_path = database.clone();
    }
    if let Command::Run(args) = &cli.command {
        apply_run_overrides(&mut config, args);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn apply_run_overrides(config: &mut ControllerConfig, args: &RunArgs) {
    if let Some(token) = &args.bot_token {
        config.notifier.bot_token = Some(token.clone());
    }
    if let Some(chat_id) = &args.chat_id {
        config.notifier.chat_id = Some(chat_id.clone());
    }
    if let Some(url) = &args.encoder_url {
        config.recognition.encoder_url = Some(url.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = load_config(&cli)?;

    match cli.command {
        Command::Run(args) => commands::run(config, args.no_notify).await,
        Command::Identities => commands::identities(&config).await,
    }
}
