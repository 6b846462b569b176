//! Filesystem helpers returning [`CoreError`].

use crate::error::CoreError;
use std::fs;
use std::io;
use std::path::Path;

/// Ensures that a directory exists at `path`, creating it and any missing
/// parents.
///
/// Fails with [`CoreError::Filesystem`] if `path` exists but is not a
/// directory, or if creation fails.
pub fn ensure_dir_exists(path: &Path) -> Result<(), CoreError> {
    if path.exists() {
        if path.is_dir() {
            Ok(())
        } else {
            Err(CoreError::Filesystem {
                message: "Path exists but is not a directory".to_string(),
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "Path exists but is not a directory"),
            })
        }
    } else {
        fs::create_dir_all(path).map_err(|e| CoreError::Filesystem {
            message: "Failed to create directory".to_string(),
            path: path.to_path_buf(),
            source: e,
        })
    }
}
