//! Configuration management.
//!
//! - [`types`]: the configuration schema ([`CoreConfig`], [`LoggingConfig`],
//!   [`DisplayConfig`], [`DemoConfig`]).
//! - [`defaults`]: default values used by `serde` for missing fields.
//! - [`loader`]: [`ConfigLoader`], which locates, parses and validates the
//!   TOML file.
//!
//! # Examples
//!
//! ```rust,ignore
//! use triflip_core::config::ConfigLoader;
//!
//! match ConfigLoader::load() {
//!     Ok(config) => println!("Frame size: {}x{}", config.display.src_width, config.display.src_height),
//!     Err(e) => {
//!         triflip_core::logging::init_minimal_logging();
//!         tracing::error!("Configuration error: {}", e);
//!     }
//! }
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, CONFIG_PATH_ENV};
pub use types::{CoreConfig, DemoConfig, DisplayConfig, LoggingConfig};
