//! HashiCorp Vault secret store adapter.
//!
//! Builds an authenticated [`VaultClient`] per refresh cycle and reads one
//! secret from a KV v1 or KV v2 mount.
//!
//! # Configuration
//!
//! - Vault server address (HTTPS recommended)
//! - CA path: a PEM file, or a directory whose `*.pem`/`*.crt` files are trusted
//! - Insecure flag: disables certificate verification
//! - Optional namespace for multi-tenancy
//! - Mount path and KV engine version (default: `secret`, v2)
//!
//! # Example
//!
//! ```rust,ignore
//! use token_fetcher::secrets::{ClientFactory, VaultClientFactory, VaultSettings};
//!
//! let factory = VaultClientFactory::new(VaultSettings {
//!     address: "https://vault.example.com:8200".to_string(),
//!     ca_path: "/etc/vault/ca.pem".into(),
//!     ..Default::default()
//! })?;
//!
//! let client = factory.create_client(&token)?;
//! let payload = client.read_secret("db/creds").await?;
//! ```
//!
//! # Security
//!
//! - The bearer token is never logged
//! - Secret values are never logged, only key names

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::{kv1, kv2};

use super::client::{ClientFactory, SecretStoreClient};
use super::error::{Result, SecretsError};
use super::types::{BearerToken, SecretPayload};

/// Version of the KV secrets engine behind the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KvVersion {
    V1,
    #[default]
    V2,
}

impl TryFrom<u8> for KvVersion {
    type Error = SecretsError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(SecretsError::config_error(format!(
                "unsupported KV engine version {}, expected 1 or 2",
                other
            ))),
        }
    }
}

/// Connection settings for the Vault adapter.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Trust root for the server certificate (file or directory)
    pub ca_path: PathBuf,

    /// Skip certificate verification
    pub insecure: bool,

    /// Vault namespace (for Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// Secrets engine mount path (default: "secret")
    pub mount_path: String,

    /// KV engine version of the mount
    pub kv_version: KvVersion,

    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: "https://127.0.0.1:8200".to_string(),
            ca_path: PathBuf::new(),
            insecure: false,
            namespace: None,
            mount_path: "secret".to_string(),
            kv_version: KvVersion::V2,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Collect the CA certificate files to trust.
///
/// A file path is used as-is. A directory contributes every `*.pem` and
/// `*.crt` entry, sorted by name. An empty directory falls back to the
/// platform roots. Every collected file must hold at least one well-formed
/// PEM certificate.
pub fn collect_ca_certs(ca_path: &Path) -> Result<Vec<String>> {
    let metadata = std::fs::metadata(ca_path).map_err(|e| {
        SecretsError::config_error(format!("CA path {} is unusable: {}", ca_path.display(), e))
    })?;

    if metadata.is_file() {
        validate_ca_bundle(ca_path)?;
        return Ok(vec![ca_path.to_string_lossy().into_owned()]);
    }

    let entries = std::fs::read_dir(ca_path).map_err(|e| {
        SecretsError::config_error(format!(
            "Failed to list CA directory {}: {}",
            ca_path.display(),
            e
        ))
    })?;

    let mut certs: Vec<String> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().is_some_and(|ext| ext == "pem" || ext == "crt")
        })
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    certs.sort();

    for cert in &certs {
        validate_ca_bundle(Path::new(cert))?;
    }

    if certs.is_empty() {
        tracing::warn!(
            ca_path = %ca_path.display(),
            "CA directory contains no certificates, using platform roots"
        );
    }

    Ok(certs)
}

/// Parse a PEM bundle and check each certificate decodes as a trust anchor.
/// Returns the number of certificates found.
fn validate_ca_bundle(path: &Path) -> Result<usize> {
    let file = std::fs::File::open(path).map_err(|e| {
        SecretsError::config_error(format!("Failed to open CA bundle {}: {}", path.display(), e))
    })?;

    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            SecretsError::config_error(format!("CA bundle {} is malformed: {}", path.display(), e))
        })?;

    if certs.is_empty() {
        return Err(SecretsError::config_error(format!(
            "CA bundle {} contains no PEM certificates",
            path.display()
        )));
    }

    let mut roots = rustls::RootCertStore::empty();
    for cert in &certs {
        roots.add(cert.clone()).map_err(|e| {
            SecretsError::config_error(format!(
                "CA bundle {} holds an invalid certificate: {}",
                path.display(),
                e
            ))
        })?;
    }

    Ok(certs.len())
}

/// Creates authenticated Vault clients.
#[derive(Debug, Clone)]
pub struct VaultClientFactory {
    settings: VaultSettings,
}

impl VaultClientFactory {
    /// Creates a factory with the given settings.
    ///
    /// # Errors
    ///
    /// [`SecretsError::ConfigError`] if the address is empty or not a URL.
    pub fn new(settings: VaultSettings) -> Result<Self> {
        if settings.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }
        // The settings builder panics on an unparseable address.
        url::Url::parse(&settings.address).map_err(|e| {
            let message = format!("Invalid Vault address '{}': {}", settings.address, e);
            SecretsError::config_error(message)
        })?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }
}

impl ClientFactory for VaultClientFactory {
    fn create_client(&self, token: &BearerToken) -> Result<Box<dyn SecretStoreClient>> {
        tracing::debug!(address = %self.settings.address, "Creating Vault client");

        let ca_certs = collect_ca_certs(&self.settings.ca_path)?;

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder
            .address(&self.settings.address)
            .token(token.expose_secret())
            .ca_certs(ca_certs)
            .verify(!self.settings.insecure)
            .namespace(self.settings.namespace.clone())
            .timeout(self.settings.timeout);

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::config_error(format!("Failed to create Vault client: {}", e))
        })?;

        tracing::debug!(
            address = %self.settings.address,
            insecure = self.settings.insecure,
            "Created Vault client"
        );

        Ok(Box::new(VaultSecretStore {
            client,
            mount_path: self.settings.mount_path.clone(),
            kv_version: self.settings.kv_version,
        }))
    }
}

/// Vault client bound to one token and one mount.
pub struct VaultSecretStore {
    client: VaultClient,
    mount_path: String,
    kv_version: KvVersion,
}

impl std::fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("mount_path", &self.mount_path)
            .field("kv_version", &self.kv_version)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

#[async_trait]
impl SecretStoreClient for VaultSecretStore {
    async fn read_secret(&self, path: &str) -> Result<SecretPayload> {
        let result: std::result::Result<BTreeMap<String, serde_json::Value>, ClientError> =
            match self.kv_version {
                KvVersion::V1 => kv1::get(&self.client, &self.mount_path, path).await,
                KvVersion::V2 => kv2::read(&self.client, &self.mount_path, path).await,
            };

        let data = result.map_err(|e| classify_client_error(e, &self.mount_path, path))?;

        tracing::debug!(
            mount_path = %self.mount_path,
            keys = data.len(),
            "Read secret from Vault"
        );

        Ok(SecretPayload::from(data))
    }
}

/// Map a vaultrs error onto the fetch error taxonomy.
fn classify_client_error(error: ClientError, mount_path: &str, path: &str) -> SecretsError {
    match error {
        ClientError::APIError { code: code @ (401 | 403), errors } => {
            SecretsError::authentication_failed(format!(
                "Vault rejected the token (status {}): {}",
                code,
                errors.join(", ")
            ))
        }
        ClientError::APIError { code: 404, .. } => {
            SecretsError::not_found(format!("{}/{}", mount_path, path))
        }
        ClientError::APIError { code, errors } => SecretsError::backend_error(format!(
            "Vault returned status {}: {}",
            code,
            errors.join(", ")
        )),
        other => SecretsError::connection_failed(other.to_string()),
    }
}
