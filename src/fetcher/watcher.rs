//! File-change trigger source for the bearer-token file.
//!
//! The token's parent directory is watched non-recursively and events are
//! filtered down to the token's file name. This keeps firing when an agent
//! rotates the token by writing a temporary file and renaming it over the
//! old one, which would silently kill a watch placed on the file itself.
//!
//! Kubernetes projected volumes rotate by swapping the `..data` symlink, which
//! produces no event for the token's file name; only the timer trigger picks
//! up that kind of rotation.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use super::trigger::TriggerEvent;
use crate::errors::{FetcherError, Result};

/// Live watch on the token file.
///
/// Dropping this stops the watch and closes the event channel.
pub struct TokenFileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl std::fmt::Debug for TokenFileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFileWatcher").field("path", &self.path).finish()
    }
}

impl TokenFileWatcher {
    /// Start watching `token_path`, forwarding events to `tx`.
    ///
    /// # Errors
    ///
    /// [`FetcherError::Watch`] if the token file does not exist or the OS
    /// watch cannot be registered. Both are fatal.
    pub fn spawn(token_path: &Path, tx: mpsc::UnboundedSender<TriggerEvent>) -> Result<Self> {
        if !token_path.exists() {
            return Err(FetcherError::watch(token_path, "token file does not exist"));
        }

        let file_name = token_path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| FetcherError::watch(token_path, "token path has no file name"))?;
        let dir = match token_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => match classify_event(&event, &file_name) {
                    Some(trigger_event) => trigger_event,
                    None => return,
                },
                Err(e) => TriggerEvent::WatchError(e.to_string()),
            };
            // receiver gone means the scheduler is shutting down
            let _ = tx.send(event);
        })
        .map_err(|e| FetcherError::watch(token_path, e.to_string()))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| FetcherError::watch(token_path, e.to_string()))?;

        tracing::info!(path = %token_path.display(), "Watching bearer-token file");

        Ok(Self { _watcher: watcher, path: token_path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turn a raw notification into a trigger event, or drop it.
///
/// Access events are dropped because every refresh opens and reads the
/// token file itself.
fn classify_event(event: &notify::Event, file_name: &OsString) -> Option<TriggerEvent> {
    if matches!(event.kind, EventKind::Access(_)) {
        return None;
    }

    let touches_token =
        event.paths.iter().any(|p| p.file_name().is_some_and(|n| n == file_name.as_os_str()));
    if !touches_token {
        return None;
    }

    Some(TriggerEvent::TokenFileChanged(event.kind))
}
