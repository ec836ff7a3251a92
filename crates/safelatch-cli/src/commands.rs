//! Subcommand handlers.

use std::time::Duration;

use anyhow::{Context, Result};
use safelatch_biometric::{AnyFaceEncoder, HttpFaceEncoder};
use safelatch_controller::Controller;
use safelatch_core::ControllerConfig;
use safelatch_network::{AnyNotifier, LogNotifier, TelegramNotifier};
use safelatch_storage::{Database, DatabaseConfig, IdentityRepository, SqliteIdentityRepository};
use tokio::signal;
use tracing::{error, info, warn};

/// Request timeout for the remote face encoder.
const ENCODER_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the controller and run until a shutdown signal arrives.
pub async fn run(config: ControllerConfig, no_notify: bool) -> Result<()> {
    let notifier = build_notifier(&config, no_notify)?;
    let encoder = build_encoder(&config)?;

    let database = Database::new(DatabaseConfig::from_storage(&config.storage))
        .await
        .with_context(|| format!("Failed to open {}", config.storage.database_path))?;
    let repository = SqliteIdentityRepository::new(
        database.pool().clone(),
        config.recognition.embedding_dim,
    );

    let devices = crate::devices::mock_devices(&config).await;

    info!(
        database = %config.storage.database_path,
        tolerance = config.recognition.tolerance,
        "Starting safelatch"
    );
    let running = Controller::new(config, devices, repository, encoder, notifier).start();

    shutdown_signal().await;

    let report = running.shutdown().await;
    database.close().await;

    if !report.is_clean() {
        error!(
            failed = report.failed,
            panicked = report.panicked,
            "Controller tasks ended abnormally"
        );
        anyhow::bail!("controller stopped with failed tasks");
    }
    info!("Shutdown complete");
    Ok(())
}

/// Print the names in the identity store, one per line.
pub async fn identities(config: &ControllerConfig) -> Result<()> {
    let database = Database::new(
        DatabaseConfig::from_storage(&config.storage).create_if_missing(false),
    )
    .await
    .with_context(|| format!("Failed to open {}", config.storage.database_path))?;
    let repository = SqliteIdentityRepository::new(
        database.pool().clone(),
        config.recognition.embedding_dim,
    );

    let names = repository
        .list_names()
        .await
        .context("Failed to read identities")?;
    for name in &names {
        println!("{name}");
    }
    info!(count = names.len(), "Identities listed");

    database.close().await;
    Ok(())
}

/// Telegram unless `--no-notify`; missing credentials are fatal.
fn build_notifier(config: &ControllerConfig, no_notify: bool) -> Result<AnyNotifier> {
    if no_notify {
        info!("Notifications go to the log only");
        return Ok(LogNotifier.into());
    }

    let notifier = TelegramNotifier::from_config(&config.notifier)
        .context("Telegram credentials are required (set BOT_TOKEN and CHAT_ID, or pass --no-notify)")?;
    Ok(notifier.into())
}

fn build_encoder(config: &ControllerConfig) -> Result<AnyFaceEncoder> {
    match &config.recognition.encoder_url {
        Some(url) => {
            let encoder =
                HttpFaceEncoder::new(url.clone(), config.recognition.embedding_dim, ENCODER_TIMEOUT)
                    .context("Failed to build face encoder client")?;
            Ok(encoder.into())
        }
        None => {
            warn!("No face encoder configured, nobody will be recognized");
            Ok(AnyFaceEncoder::Disabled)
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
