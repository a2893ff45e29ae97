//! # Error Types
//!
//! Error taxonomy for the token fetcher using `thiserror`.
//!
//! Only configuration and trigger setup failures are fatal. Everything that
//! can go wrong inside a refresh cycle aborts that cycle, gets logged, and
//! waits for the next trigger.

use std::path::PathBuf;

use crate::secrets::SecretsError;

/// Custom result type for token fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Main error type for the token fetcher
#[derive(thiserror::Error, Debug)]
pub enum FetcherError {
    /// Configuration errors (bad values, unparseable settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Required settings missing or out of range
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Invalid schedule expression
    #[error("Invalid schedule expression '{expression}': {message}")]
    Schedule { expression: String, message: String },

    /// The bearer-token file could not be read or was empty
    #[error("Failed to read bearer token from {}: {message}", path.display())]
    TokenRead { path: PathBuf, message: String },

    /// Secret store failures (client construction, auth, fetch)
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// The payload could not be represented in the chosen format
    #[error("Failed to encode secret as {format}: {message}")]
    Encode { format: String, message: String },

    /// The destination file could not be replaced
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token-file watch could not be established
    #[error("Failed to watch {}: {message}", path.display())]
    Watch { path: PathBuf, message: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
}

impl FetcherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a schedule error
    pub fn schedule<E: Into<String>, M: Into<String>>(expression: E, message: M) -> Self {
        Self::Schedule { expression: expression.into(), message: message.into() }
    }

    /// Create a token read error
    pub fn token_read<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::TokenRead { path: path.into(), message: message.into() }
    }

    /// Create an encode error
    pub fn encode<F: ToString, M: Into<String>>(format: F, message: M) -> Self {
        Self::Encode { format: format.to_string(), message: message.into() }
    }

    /// Create a destination write error
    pub fn write<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }

    /// Create a watch setup error
    pub fn watch<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Watch { path: path.into(), message: message.into() }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Whether this error must terminate the process.
    ///
    /// Startup-only conditions are fatal. Anything raised inside a refresh
    /// cycle is not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::Validation { .. }
                | Self::Schedule { .. }
                | Self::Watch { .. }
        )
    }

    /// Short machine-friendly name used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Schedule { .. } => "schedule",
            Self::TokenRead { .. } => "token_read",
            Self::Secrets(e) => e.kind(),
            Self::Encode { .. } => "encode",
            Self::Write { .. } => "write",
            Self::Watch { .. } => "watch",
            Self::Io { .. } => "io",
        }
    }
}

impl From<validator::ValidationErrors> for FetcherError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|k| k.to_string());
        Self::Validation { message: errors.to_string(), field }
    }
}
