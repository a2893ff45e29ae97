//! Value types that live for a single refresh cycle.
//!
//! [`BearerToken`] is read fresh from disk on every cycle and never outlives
//! it. [`SecretPayload`] is the key/value map returned by one secret read.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token presented to the secret store.
///
/// # Security
///
/// - Debug output shows `BearerToken([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - **Memory is zeroed when dropped** (via `zeroize` crate)
/// - The raw value is only reachable through [`BearerToken::expose_secret`]
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a token from raw file contents, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn from_contents(contents: &str) -> Option<Self> {
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Reads the token file.
    ///
    /// An empty file is reported as `InvalidData`, which happens transiently
    /// while an agent truncates and rewrites the token.
    pub async fn read_from(path: &Path) -> std::io::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_contents(&contents).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "token file is empty")
        })
    }

    /// Exposes the underlying token value.
    ///
    /// Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns the length of the token without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken([REDACTED])")
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Flat key/value mapping returned by one secret read.
///
/// Keys are kept sorted so that encoding the same secret twice produces the
/// same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SecretPayload(BTreeMap<String, serde_json::Value>);

impl SecretPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key names only, safe to log.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, serde_json::Value>> for SecretPayload {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, serde_json::Value)> for SecretPayload {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
