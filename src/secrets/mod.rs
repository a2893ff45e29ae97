//! Secret store client adapter.
//!
//! The refresh cycle talks to the secret store through two traits:
//!
//! - [`ClientFactory`]: builds an authenticated client from the current
//!   bearer token (once per cycle)
//! - [`SecretStoreClient`]: reads one secret path into a [`SecretPayload`]
//!
//! [`VaultClientFactory`] is the HashiCorp Vault implementation, backed by
//! `vaultrs` against a KV v1 or KV v2 mount.
//!
//! # Example
//!
//! ```rust,ignore
//! use token_fetcher::secrets::{BearerToken, ClientFactory, VaultClientFactory, VaultSettings};
//!
//! let factory = VaultClientFactory::new(settings)?;
//! let token = BearerToken::read_from(&token_path).await?;
//! let client = factory.create_client(&token)?;
//! let payload = client.read_secret("db/creds").await?;
//! ```
//!
//! # Security Considerations
//!
//! - The bearer token is redacted in `Debug`/`Display` and zeroed on drop
//! - Secret values are never logged, only key names

pub mod client;
pub mod error;
pub mod types;
pub mod vault;

pub use client::{ClientFactory, SecretStoreClient};
pub use error::{Result, SecretsError};
pub use types::{BearerToken, SecretPayload};
pub use vault::{collect_ca_certs, KvVersion, VaultClientFactory, VaultSecretStore, VaultSettings};
