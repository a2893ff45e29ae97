//! Core secret store client traits.

use async_trait::async_trait;

use super::error::Result;
use super::types::{BearerToken, SecretPayload};

/// An authenticated client able to read secrets from the store.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values or the bearer token
/// - Network communication SHOULD use TLS
#[async_trait]
pub trait SecretStoreClient: Send + Sync {
    /// Read the secret at `path` and return its key/value data.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the token is rejected
    /// - `NotFound` if nothing lives at `path`
    /// - `ConnectionFailed` on network failure
    async fn read_secret(&self, path: &str) -> Result<SecretPayload>;
}

/// Builds a fresh authenticated client for each refresh cycle.
///
/// A new client is created per cycle because the token may have been
/// rotated since the last one.
pub trait ClientFactory: Send + Sync {
    /// Create a client that presents `token` on every request.
    ///
    /// # Errors
    ///
    /// [`SecretsError::ConfigError`](super::SecretsError::ConfigError) when TLS
    /// material or the address cannot be used.
    fn create_client(&self, token: &BearerToken) -> Result<Box<dyn SecretStoreClient>>;
}
