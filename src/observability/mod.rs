//! # Observability
//!
//! Structured logging for the token fetcher. Each refresh cycle runs inside a
//! `refresh_cycle` span (see [`refresh_span!`](crate::refresh_span)) so every
//! component logs with the trigger and cycle id attached.

pub mod logging;

pub use logging::{build_filter, init_logging, log_config_info, parse_level};
