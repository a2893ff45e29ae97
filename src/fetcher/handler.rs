//! Token handler: one end-to-end refresh cycle.
//!
//! ```text
//! token file ─► BearerToken ─► ClientFactory ─► read_secret ─► encode ─► atomic replace
//! ```
//!
//! Every step's failure aborts only the current cycle. The previous
//! destination content stays in place and the next trigger is the retry.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, Instrument};

use super::scheduler::RefreshCycle;
use super::trigger::Trigger;
use crate::config::RefreshConfig;
use crate::errors::{FetcherError, Result};
use crate::properties::replace_atomically;
use crate::secrets::{BearerToken, ClientFactory, VaultClientFactory};

/// Outcome of a successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub bytes_written: usize,
    pub keys: usize,
}

/// Runs refresh cycles against one destination.
///
/// Holds only immutable state; any number of cycles may run concurrently.
pub struct TokenHandler {
    config: Arc<RefreshConfig>,
    factory: Arc<dyn ClientFactory>,
}

impl TokenHandler {
    pub fn new(config: Arc<RefreshConfig>, factory: Arc<dyn ClientFactory>) -> Self {
        Self { config, factory }
    }

    /// Build a handler backed by Vault.
    pub fn from_config(config: RefreshConfig) -> Result<Self> {
        let factory = VaultClientFactory::new(config.vault.clone())?;
        Ok(Self::new(Arc::new(config), Arc::new(factory)))
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Run one cycle and return its outcome instead of logging it.
    pub async fn try_refresh(&self) -> Result<RefreshReport> {
        let config = &self.config;

        // read fresh every cycle, the file may have just been rotated
        let token = BearerToken::read_from(&config.token_path)
            .await
            .map_err(|e| FetcherError::token_read(&config.token_path, e.to_string()))?;
        debug!(path = %config.token_path.display(), "Read bearer token");

        let client = self.factory.create_client(&token)?;

        debug!(secret_path = %config.secret_path, "Reading secret");
        let payload = client.read_secret(&config.secret_path).await?;
        drop(token);

        let format = config.destination.format;
        let contents = format.encode(&payload)?;
        let report = RefreshReport { bytes_written: contents.len(), keys: payload.len() };

        let path = config.destination.path.clone();
        let mode = config.destination.mode;
        tokio::task::spawn_blocking(move || replace_atomically(&path, &contents, mode))
            .await
            .map_err(|e| {
                FetcherError::io(std::io::Error::other(e.to_string()), "destination write panicked")
            })??;

        Ok(report)
    }
}

#[async_trait]
impl RefreshCycle for TokenHandler {
    async fn refresh(&self, trigger: Trigger) {
        let span = crate::refresh_span!(trigger);

        async {
            match self.try_refresh().await {
                Ok(report) => info!(
                    destination = %self.config.destination.path.display(),
                    format = %self.config.destination.format,
                    keys = report.keys,
                    bytes = report.bytes_written,
                    "Wrote secret"
                ),
                Err(e) => error!(
                    error = %e,
                    kind = e.kind(),
                    destination = %self.config.destination.path.display(),
                    "Refresh cycle failed"
                ),
            }
        }
        .instrument(span)
        .await
    }
}
