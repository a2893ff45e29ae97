//! # Configuration Management
//!
//! Settings arrive as CLI flags with environment-variable fallbacks (see
//! [`FetcherSettings`]) and are validated once at startup into an
//! [`AppConfig`]. Any invalid key aborts the process before the first
//! refresh runs.

pub mod settings;

pub use settings::{
    parse_mode, AppConfig, DestinationConfig, FetcherSettings, LogFormat, ObservabilityConfig,
    RefreshConfig,
};
