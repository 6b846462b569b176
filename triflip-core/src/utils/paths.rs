//! Application-specific directory resolution.
//!
//! Paths follow the XDG Base Directory Specification through the
//! `directories-next` crate:
//! - [`get_app_config_dir()`]: e.g. `~/.config/triflip`.
//! - [`get_app_state_dir()`]: e.g. `~/.local/state/triflip`, used to resolve
//!   relative log file paths.
//!
//! Both return [`ConfigError::DirectoryUnavailable`] (wrapped in
//! [`CoreError::Config`]) when no home directory can be determined.

use crate::error::{ConfigError, CoreError};
use directories_next::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "Triflip";
const APPLICATION: &str = "triflip";

/// Returns the application configuration directory.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| unavailable("App Config"))
}

/// Returns the application state directory.
///
/// `directories-next` has no state directory, so on Linux this is built from
/// `$XDG_STATE_HOME` (or `~/.local/state`); elsewhere the local data directory
/// is used.
pub fn get_app_state_dir() -> Result<PathBuf, CoreError> {
    let base = BaseDirs::new().ok_or_else(|| unavailable("State Base"))?;

    #[cfg(target_os = "linux")]
    let state_base = match std::env::var("XDG_STATE_HOME") {
        Ok(state_home) if !state_home.is_empty() => PathBuf::from(state_home),
        _ => base.home_dir().join(".local/state"),
    };
    #[cfg(not(target_os = "linux"))]
    let state_base = base.data_local_dir().to_path_buf();

    Ok(state_base.join(APPLICATION))
}

fn unavailable(dir_type: &str) -> CoreError {
    CoreError::Config(ConfigError::DirectoryUnavailable {
        dir_type: dir_type.to_string(),
    })
}
