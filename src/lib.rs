//! # Token Fetcher
//!
//! A sidecar that keeps a local credentials file in sync with a secret held
//! in HashiCorp Vault.
//!
//! ## Architecture
//!
//! ```text
//! startup ─┐
//! cron ────┼──► TokenHandler ──► Vault KV ──► YAML / JSON ──► atomic file replace
//! token ───┘
//! file watch
//! ```
//!
//! One refresh runs at startup. After that a cron schedule and a watch on
//! the bearer-token file each trigger further refreshes. Every refresh reads
//! the token afresh, so a rotated token is picked up by the very cycle its
//! rotation triggers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use token_fetcher::{AppConfig, FetcherSettings, Scheduler, TokenFileWatcher, TokenHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(settings: FetcherSettings) -> token_fetcher::Result<()> {
//! let config = AppConfig::from_settings(settings)?;
//! let handler = Arc::new(TokenHandler::from_config(config.refresh.clone())?);
//!
//! let token_path = config.refresh.token_path.clone();
//! Scheduler::new(handler, config.refresh.schedule.clone())
//!     .run(move |tx| TokenFileWatcher::spawn(&token_path, tx), CancellationToken::new())
//!     .await
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod observability;
pub mod properties;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{AppConfig, FetcherSettings, RefreshConfig};
pub use errors::{FetcherError, Result};
pub use fetcher::{
    CronSchedule, RefreshCycle, RefreshReport, Scheduler, TokenFileWatcher, TokenHandler, Trigger,
    TriggerEvent,
};
pub use properties::PropertiesFormat;
pub use secrets::{BearerToken, SecretPayload};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
