//! General utilities.
//!
//! - [`fs`]: directory creation with [`crate::error::CoreError`] mapping.
//! - [`paths`]: XDG and application-specific directory resolution.

pub mod fs;
pub mod paths;

pub use fs::ensure_dir_exists;
