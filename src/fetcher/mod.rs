//! # Fetcher
//!
//! The trigger-and-refresh pipeline.
//!
//! - [`TokenHandler`] runs one refresh cycle: read the bearer token, build an
//!   authenticated client, read the secret, encode it, and atomically replace
//!   the destination file.
//! - [`Scheduler`] runs the startup refresh and then drives the handler from
//!   a [`CronSchedule`] timer and a [`TokenFileWatcher`].
//!
//! Only setup failures (an invalid schedule, an unwatchable token file) are
//! fatal. Every failure inside a cycle is logged and the next trigger retries.

pub mod handler;
pub mod schedule;
pub mod scheduler;
pub mod trigger;
pub mod watcher;

pub use handler::{RefreshReport, TokenHandler};
pub use schedule::CronSchedule;
pub use scheduler::{RefreshCycle, Scheduler};
pub use trigger::{Trigger, TriggerEvent};
pub use watcher::TokenFileWatcher;
