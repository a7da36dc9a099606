//! Filesystem operations
//!
//! Directory probing used while locating package manifests.

use std::path::Path;

use crate::error::ChangeError;

/// Check whether `dir` directly contains an entry named `file_name`.
///
/// A directory that does not exist (for example the parent of a deleted
/// file) contains nothing.
pub fn dir_contains(dir: &Path, file_name: &str) -> Result<bool, ChangeError> {
    if !dir.is_dir() {
        return Ok(false);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ChangeError::IoError {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ChangeError::IoError {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        if entry.file_name() == file_name {
            return Ok(true);
        }
    }
    Ok(false)
}
