//! Trigger vocabulary shared by the scheduler and the refresh cycle.

use notify::EventKind;
use std::fmt;

/// Why a refresh cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The unconditional refresh before any trigger source is armed
    Startup,
    /// The recurring schedule fired
    Schedule,
    /// The bearer-token file changed
    TokenFile,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "startup"),
            Self::Schedule => write!(f, "schedule"),
            Self::TokenFile => write!(f, "token_file"),
        }
    }
}

/// An event produced by one of the trigger sources.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    ScheduleFired,
    TokenFileChanged(EventKind),
    /// The notification source reported an error. Never starts a refresh.
    WatchError(String),
}

impl TriggerEvent {
    /// The refresh this event asks for, if any.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Self::ScheduleFired => Some(Trigger::Schedule),
            Self::TokenFileChanged(_) => Some(Trigger::TokenFile),
            Self::WatchError(_) => None,
        }
    }
}
