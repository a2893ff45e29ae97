//! Atomic replacement of the destination file.
//!
//! The new contents go to a temporary file in the destination's directory,
//! are flushed to disk, and then renamed over the destination. Readers see
//! either the previous complete file or the new complete file.

use std::io::Write;
use std::path::Path;

use crate::errors::{FetcherError, Result};

/// Replace `path` with `contents` in a single rename.
///
/// `mode` sets the unix permission bits of the new file. The temporary file
/// is removed if anything fails before the rename, leaving `path` untouched.
pub fn replace_atomically(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| FetcherError::write(path, e))?;

    tmp.write_all(contents).map_err(|e| FetcherError::write(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))
                .map_err(|e| FetcherError::write(path, e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.as_file().sync_all().map_err(|e| FetcherError::write(path, e))?;

    tmp.persist(path).map_err(|e| FetcherError::write(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "Replaced destination file");
    Ok(())
}
