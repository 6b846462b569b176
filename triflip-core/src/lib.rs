//! # Triflip Core Library (`triflip-core`)
//!
//! Foundation shared by the triflip crates:
//!
//! - **Error Handling**: [`CoreError`] and the specific [`ConfigError`] and
//!   [`LoggingError`].
//! - **Core Data Types**: integer geometry ([`PointInt`], [`SizeInt`],
//!   [`RectInt`]), [`AspectRatio`] with [`fit_to_display`], and
//!   [`PixelFormat`].
//! - **Configuration Management**: TOML configuration with defaults and
//!   validation through [`ConfigLoader`].
//! - **Logging**: `tracing` based console and file logging.
//!
//! ```rust,ignore
//! use triflip_core::config::ConfigLoader;
//! use triflip_core::logging::init_logging;
//! use triflip_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let config = ConfigLoader::load()?;
//!     init_logging(&config.logging, false)?;
//!     tracing::info!("triflip core initialized");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

pub use config::{ConfigLoader, CoreConfig, DemoConfig, DisplayConfig, LoggingConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use types::{fit_to_display, AspectRatio, PixelFormat, PointInt, RectInt, SizeInt};
