//! Configuration loading for triflip.
//!
//! [`ConfigLoader::load`] looks for a TOML file at `$TRIFLIP_CONFIG`, falling
//! back to `config.toml` inside the application config directory. A missing
//! file yields the default configuration. Whatever was loaded is then
//! validated and normalized by [`ConfigLoader::validate_config`].

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::types::PixelFormat;
use crate::utils::fs as triflip_fs;
use crate::utils::paths::{get_app_config_dir, get_app_state_dir};

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "TRIFLIP_CONFIG";

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the configuration from the default location.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ReadError`] if the file exists but cannot be read.
    /// - [`ConfigError::ParseError`] for malformed TOML.
    /// - [`ConfigError::ValidationError`] for out-of-range values.
    /// - [`ConfigError::DirectoryUnavailable`] if no config directory can be determined.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let path = Self::default_path()?;
        match Self::read_optional(&path)? {
            Some(content) => Self::parse_and_validate(&content),
            None => {
                tracing::debug!("No configuration file at {:?}, using defaults", path);
                let mut config = CoreConfig::default();
                Self::validate_config(&mut config)?;
                Ok(config)
            }
        }
    }

    /// Loads and validates the configuration from an explicit file.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_and_validate(&content)
    }

    /// Parses TOML text into a validated [`CoreConfig`].
    pub fn parse_and_validate(content: &str) -> Result<CoreConfig, CoreError> {
        let mut config: CoreConfig = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    fn default_path() -> Result<PathBuf, CoreError> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(get_app_config_dir()?.join("config.toml")),
        }
    }

    fn read_optional(path: &Path) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            }
            .into()),
        }
    }

    /// Validates the configuration and normalizes it in place.
    ///
    /// - Log level and format are lower-cased and checked.
    /// - A relative log file path is resolved against the application state
    ///   directory, and the log file's parent directory is created.
    /// - Display geometry must describe a non-empty frame with a supported
    ///   depth and a pitch that holds whole pixels.
    pub fn validate_config(config: &mut CoreConfig) -> Result<(), CoreError> {
        let level_lower = config.logging.level.to_lowercase();
        match level_lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level_lower,
            _ => {
                return Err(invalid(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                )))
            }
        }

        let format_lower = config.logging.format.to_lowercase();
        match format_lower.as_str() {
            "text" | "json" => config.logging.format = format_lower,
            _ => {
                return Err(invalid(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                )))
            }
        }

        if let Some(path) = &config.logging.file_path {
            let absolute = if path.is_absolute() {
                path.clone()
            } else {
                get_app_state_dir()?.join(path)
            };
            if let Some(parent) = absolute.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    triflip_fs::ensure_dir_exists(parent)?;
                }
            }
            config.logging.file_path = Some(absolute);
        }

        let display = &config.display;
        if display.src_width == 0 || display.src_height == 0 {
            return Err(invalid(format!(
                "Source dimensions must be positive, got {}x{}",
                display.src_width, display.src_height
            )));
        }
        let format = PixelFormat::from_bits_per_pixel(display.bits_per_pixel).ok_or_else(|| {
            invalid(format!(
                "Unsupported bits_per_pixel: {}. Must be one of 8, 16, 32.",
                display.bits_per_pixel
            ))
        })?;
        let pitch = display.effective_pitch();
        let row_bytes = display.src_width.saturating_mul(format.bytes_per_pixel());
        if pitch < row_bytes || pitch % format.bytes_per_pixel() != 0 {
            return Err(invalid(format!(
                "visible_pitch {} must be a multiple of {} bytes and at least {}",
                pitch,
                format.bytes_per_pixel(),
                row_bytes
            )));
        }
        if display.content_pages == 0 {
            return Err(invalid("content_pages must be at least 1".to_string()));
        }

        if config.demo.bar_width == 0 || config.demo.bar_width > display.src_width {
            return Err(invalid(format!(
                "demo.bar_width must be between 1 and src_width ({}), got {}",
                display.src_width, config.demo.bar_width
            )));
        }
        if config.demo.vsync_interval_ms == 0 {
            return Err(invalid("demo.vsync_interval_ms must be positive".to_string()));
        }
        if config.demo.display_width == 0 || config.demo.display_height == 0 {
            return Err(invalid(format!(
                "Simulated display must be non-empty, got {}x{}",
                config.demo.display_width, config.demo.display_height
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::Config(ConfigError::ValidationError(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_path_full() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("triflip.log");
        let content = format!(
            r#"
            [logging]
            level = "DEBUG"
            format = "Json"
            file_path = "{}"

            [display]
            src_width = 320
            src_height = 200
            bits_per_pixel = 32
            keep_aspect = true

            [demo]
            bar_width = 20
            "#,
            log_path.display()
        );
        let path = write_config(&dir, &content);

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.file_path, Some(log_path.clone()));
        assert!(log_path.parent().unwrap().is_dir(), "log directory should be created");
        assert_eq!(config.display.effective_pitch(), 1280);
        assert!(config.display.keep_aspect);
        assert_eq!(config.demo.bar_width, 20);
    }

    #[test]
    fn test_load_from_missing_path_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_parse_error() {
        let err = ConfigLoader::parse_and_validate("[display\nsrc_width = 3").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseError(_))));
    }

    #[rstest]
    #[case("[logging]\nlevel = \"loud\"\n")]
    #[case("[logging]\nformat = \"xml\"\n")]
    #[case("[display]\nsrc_width = 0\n")]
    #[case("[display]\nsrc_height = 0\n")]
    #[case("[display]\nbits_per_pixel = 24\n")]
    #[case("[display]\nbits_per_pixel = 32\nvisible_pitch = 6\n")]
    #[case("[display]\nvisible_pitch = 0\n")]
    #[case("[display]\nsrc_width = 100\nvisible_pitch = 100\n")]
    #[case("[display]\ncontent_pages = 0\n")]
    #[case("[demo]\nbar_width = 1000\n")]
    #[case("[demo]\nvsync_interval_ms = 0\n")]
    #[case("[demo]\ndisplay_height = 0\n")]
    fn test_validation_failures(#[case] content: &str) {
        let err = ConfigLoader::parse_and_validate(content).unwrap_err();
        assert!(
            matches!(err, CoreError::Config(ConfigError::ValidationError(_))),
            "expected validation error for {:?}, got {:?}",
            content,
            err
        );
    }

    #[test]
    fn test_defaults_validate() {
        let config = ConfigLoader::parse_and_validate("").unwrap();
        assert_eq!(config, CoreConfig::default());
    }
}
