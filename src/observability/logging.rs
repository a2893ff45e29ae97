//! # Structured Logging
//!
//! Installs the global `tracing` subscriber and provides the span macro every
//! refresh cycle runs under.
//!
//! The level comes from configuration. When `RUST_LOG` is set it takes
//! precedence.

use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{AppConfig, LogFormat, ObservabilityConfig};
use crate::errors::{FetcherError, Result};

/// Create a tracing span for one refresh cycle.
///
/// ```rust,ignore
/// let span = refresh_span!(Trigger::Startup);
/// let span = refresh_span!(Trigger::TokenFile, destination = %path.display());
/// ```
#[macro_export]
macro_rules! refresh_span {
    ($trigger:expr) => {
        tracing::info_span!(
            "refresh_cycle",
            trigger = %$trigger,
            cycle_id = %uuid::Uuid::new_v4()
        )
    };
    ($trigger:expr, $($field:tt)*) => {
        tracing::info_span!(
            "refresh_cycle",
            trigger = %$trigger,
            cycle_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Parse a configured log level.
///
/// Accepts the `tracing` level names plus `warning`, `fatal` and `panic`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let normalized = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "fatal" | "panic" => "error".to_string(),
        other => other.to_string(),
    };

    LevelFilter::from_str(&normalized).map_err(|_| {
        FetcherError::validation_field(format!("Invalid log level '{}'", level), "log_level")
    })
}

/// Build the filter for `level`, deferring to `RUST_LOG` when it is set.
pub fn build_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

/// Install the global subscriber.
///
/// # Errors
///
/// A malformed level, or a subscriber already being installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let level = parse_level(&config.log_level)?;

    let fmt_layer = match config.log_format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(true).with_current_span(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            FetcherError::config_with_source("Failed to install log subscriber", Box::new(e))
        })
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    let refresh = &config.refresh;
    tracing::info!(
        vault_addr = %refresh.vault.address,
        mount = %refresh.vault.mount_path,
        kv_version = ?refresh.vault.kv_version,
        insecure = refresh.vault.insecure,
        token_path = %refresh.token_path.display(),
        destination = %refresh.destination.path.display(),
        format = %refresh.destination.format,
        schedule = %refresh.schedule,
        "Token fetcher configuration"
    );
    tracing::debug!(secret_path = %refresh.secret_path, "Secret to fetch");
}
