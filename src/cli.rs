//! # Command Line Interface
//!
//! Parses the process arguments and runs the fetcher until a shutdown signal,
//! or runs a single refresh with `--once`.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

use crate::config::{AppConfig, FetcherSettings};
use crate::fetcher::{RefreshReport, Scheduler, TokenFileWatcher, TokenHandler, Trigger};
use crate::observability::{init_logging, log_config_info};
use crate::{APP_NAME, VERSION};

#[derive(Debug, Parser)]
#[command(name = "token-fetcher")]
#[command(about = "Keeps a local file in sync with a secret stored in Vault")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(flatten)]
    pub settings: FetcherSettings,

    /// Run the startup refresh only and exit with its status
    #[arg(long, env = "FETCH_ONCE")]
    pub once: bool,
}

/// Run the fetcher described by `cli`.
///
/// Returns an error for fatal conditions only: invalid configuration, a
/// logging setup failure, an unwatchable token file, or a failed refresh in
/// `--once` mode.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_settings(cli.settings).context("Invalid configuration")?;
    init_logging(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, once = cli.once, "Starting token fetcher");
    log_config_info(&config);

    let handler = TokenHandler::from_config(config.refresh.clone())?;

    if cli.once {
        let report = run_once(&handler).await?;
        info!(keys = report.keys, bytes = report.bytes_written, "One-shot refresh completed");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let token_path = config.refresh.token_path.clone();
    Scheduler::new(Arc::new(handler), config.refresh.schedule.clone())
        .with_debounce(config.refresh.watch_debounce)
        .run(move |tx| TokenFileWatcher::spawn(&token_path, tx), shutdown)
        .await?;

    info!("Token fetcher stopped");
    Ok(())
}

async fn run_once(handler: &TokenHandler) -> anyhow::Result<RefreshReport> {
    let span = crate::refresh_span!(Trigger::Startup);
    let outcome = handler.try_refresh().instrument(span).await;

    outcome.map_err(|e| {
        error!(error = %e, kind = e.kind(), "One-shot refresh failed");
        anyhow::Error::new(e)
    })
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
