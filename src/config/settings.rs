//! # Configuration Settings
//!
//! Defines the raw settings accepted on the command line / environment and
//! the validated configuration the refresh cycle runs with.

use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::errors::{FetcherError, Result};
use crate::fetcher::CronSchedule;
use crate::properties::PropertiesFormat;
use crate::secrets::{KvVersion, VaultSettings};

/// Raw settings, one field per configuration key.
///
/// Every key is a long flag with an environment-variable fallback.
#[derive(Debug, Clone, clap::Args, Validate)]
pub struct FetcherSettings {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR", default_value = "", hide_default_value = true)]
    #[validate(length(min = 1, message = "vault-addr is required"))]
    pub vault_addr: String,

    /// CA certificate file, or directory of *.pem / *.crt files
    #[arg(long, env = "VAULT_CAPATH", default_value = "", hide_default_value = true)]
    #[validate(length(min = 1, message = "vault-capath is required"))]
    pub vault_capath: String,

    /// Skip server certificate verification
    #[arg(long, env = "VAULT_INSECURE")]
    pub vault_insecure: bool,

    /// Path of the bearer-token file
    #[arg(long, env = "VAULT_TOKEN", default_value = "", hide_default_value = true)]
    #[validate(length(min = 1, message = "vault-token is required"))]
    pub vault_token: String,

    /// Secret path inside the mount
    #[arg(long, env = "VAULT_SECRET", default_value = "", hide_default_value = true)]
    #[validate(length(min = 1, message = "vault-secret is required"))]
    pub vault_secret: String,

    /// Secrets engine mount
    #[arg(long, env = "VAULT_MOUNT", default_value = "secret")]
    #[validate(length(min = 1, message = "vault-mount cannot be empty"))]
    pub vault_mount: String,

    /// KV secrets engine version (1 or 2)
    #[arg(long, env = "VAULT_KV_VERSION", default_value_t = 2)]
    #[validate(range(min = 1, max = 2, message = "vault-kv-version must be 1 or 2"))]
    pub vault_kv_version: u8,

    /// Vault Enterprise namespace
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub vault_namespace: Option<String>,

    /// Vault request timeout in seconds
    #[arg(long, env = "VAULT_TIMEOUT", default_value_t = 30)]
    #[validate(range(min = 1, max = 300, message = "vault-timeout must be between 1 and 300"))]
    pub vault_timeout: u64,

    /// Destination file
    #[arg(long, env = "PROPERTIES_FILE", default_value = "", hide_default_value = true)]
    #[validate(length(min = 1, message = "properties-file is required"))]
    pub properties_file: String,

    /// Destination format override (yaml, yml or json)
    #[arg(long, env = "PROPERTIES_TYPE")]
    pub properties_type: Option<String>,

    /// Octal permission bits of the destination file
    #[arg(long, env = "PROPERTIES_MODE", default_value = "600")]
    pub properties_mode: String,

    /// Refresh schedule (cron expression, @hourly-style alias, or @every <interval>)
    #[arg(long, env = "VAULT_TOKEN_FETCHER_CRON", default_value = "@hourly")]
    #[validate(length(min = 1, message = "vault-token-fetcher-cron cannot be empty"))]
    pub vault_token_fetcher_cron: String,

    /// Window in which token-file changes are coalesced (0 disables)
    #[arg(long, env = "WATCH_DEBOUNCE_MS", default_value_t = 250)]
    #[validate(range(max = 60000, message = "watch-debounce-ms must be at most 60000"))]
    pub watch_debounce_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    #[validate(length(min = 1, message = "log-level cannot be empty"))]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            vault_addr: String::new(),
            vault_capath: String::new(),
            vault_insecure: false,
            vault_token: String::new(),
            vault_secret: String::new(),
            vault_mount: "secret".to_string(),
            vault_kv_version: 2,
            vault_namespace: None,
            vault_timeout: 30,
            properties_file: String::new(),
            properties_type: None,
            properties_mode: "600".to_string(),
            vault_token_fetcher_cron: "@hourly".to_string(),
            watch_debounce_ms: 250,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl FetcherSettings {
    /// Validate every key. Any failure is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(FetcherError::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        url::Url::parse(&self.vault_addr).map_err(|e| {
            FetcherError::validation_field(
                format!("vault-addr '{}' is not a valid URL: {}", self.vault_addr, e),
                "vault_addr",
            )
        })?;

        if !PathBuf::from(&self.vault_capath).exists() {
            return Err(FetcherError::validation_field(
                format!("vault-capath '{}' does not exist", self.vault_capath),
                "vault_capath",
            ));
        }

        parse_mode(&self.properties_mode)?;
        crate::observability::parse_level(&self.log_level)?;

        Ok(())
    }
}

/// Parse an octal permission string such as `600` or `0640`.
pub fn parse_mode(mode: &str) -> Result<u32> {
    let trimmed = mode.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let value = u32::from_str_radix(digits, 8).map_err(|_| {
        FetcherError::validation_field(
            format!("properties-mode '{}' is not an octal mode", mode),
            "properties_mode",
        )
    })?;
    if value > 0o777 {
        return Err(FetcherError::validation_field(
            format!("properties-mode '{}' exceeds 777", mode),
            "properties_mode",
        ));
    }
    Ok(value)
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), log_format: LogFormat::Text }
    }
}

/// Where and how the secret is written.
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    pub path: PathBuf,
    pub format: PropertiesFormat,
    /// Unix permission bits for the written file
    pub mode: Option<u32>,
}

/// Everything one refresh cycle and the trigger sources need.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub vault: VaultSettings,
    pub token_path: PathBuf,
    pub secret_path: String,
    pub destination: DestinationConfig,
    pub schedule: CronSchedule,
    pub watch_debounce: Duration,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub refresh: RefreshConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate `settings` and build the runtime configuration.
    pub fn from_settings(settings: FetcherSettings) -> Result<Self> {
        settings.validate()?;

        let kv_version = KvVersion::try_from(settings.vault_kv_version)?;
        let destination_path = PathBuf::from(&settings.properties_file);
        let format =
            PropertiesFormat::resolve(settings.properties_type.as_deref(), &destination_path)?;
        let schedule = CronSchedule::parse(&settings.vault_token_fetcher_cron)?;
        let mode = parse_mode(&settings.properties_mode)?;

        let vault = VaultSettings {
            address: settings.vault_addr,
            ca_path: PathBuf::from(settings.vault_capath),
            insecure: settings.vault_insecure,
            namespace: settings.vault_namespace.filter(|ns| !ns.is_empty()),
            mount_path: settings.vault_mount,
            kv_version,
            timeout: Some(Duration::from_secs(settings.vault_timeout)),
        };

        Ok(Self {
            refresh: RefreshConfig {
                vault,
                token_path: PathBuf::from(settings.vault_token),
                secret_path: settings.vault_secret,
                destination: DestinationConfig { path: destination_path, format, mode: Some(mode) },
                schedule,
                watch_debounce: Duration::from_millis(settings.watch_debounce_ms),
            },
            observability: ObservabilityConfig {
                log_level: settings.log_level,
                log_format: settings.log_format,
            },
        })
    }
}
