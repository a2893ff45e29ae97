//! # Error Handling
//!
//! Process-level error types for the token fetcher. Secret store failures
//! live in [`crate::secrets::SecretsError`] and are wrapped here.

pub mod types;

pub use types::{FetcherError, Result};
