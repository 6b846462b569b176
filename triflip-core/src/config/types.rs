//! Configuration data structures for triflip.
//!
//! These structs are populated by deserializing a TOML file. Missing fields
//! take their values from [`super::defaults`], and unknown fields are rejected
//! via `#[serde(deny_unknown_fields)]`.

use super::defaults;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use triflip_core::config::LoggingConfig;
///
/// let log_config: LoggingConfig = toml::from_str(r#"
/// level = "debug"
/// format = "json"
/// "#).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, None);
/// assert_eq!(log_config.format, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// The minimum log level to record.
    /// Valid values (case-insensitive): "trace", "debug", "info", "warn", "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional path to a log file. Relative paths are resolved against the
    /// application's state directory. `None` disables file logging.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// Valid values (case-insensitive): "text", "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Geometry and buffering parameters used to set up a display context.
///
/// `visible_pitch` is the number of bytes per source row that carry visible
/// pixels. It defaults to `src_width * bytes_per_pixel` when omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    #[serde(default = "defaults::default_display_id")]
    pub display_id: u32,
    #[serde(default = "defaults::default_src_width")]
    pub src_width: u32,
    #[serde(default = "defaults::default_src_height")]
    pub src_height: u32,
    #[serde(default = "defaults::default_bits_per_pixel")]
    pub bits_per_pixel: u32,
    #[serde(default)]
    pub visible_pitch: Option<u32>,
    /// Keep the source aspect ratio instead of stretching to the display's.
    #[serde(default)]
    pub keep_aspect: bool,
    #[serde(default = "defaults::default_content_pages")]
    pub content_pages: usize,
    #[serde(default = "defaults::default_opacity")]
    pub opacity: u8,
}

impl DisplayConfig {
    /// The configured pitch, or the tightly packed pitch for the source width.
    pub fn effective_pitch(&self) -> u32 {
        self.visible_pitch
            .unwrap_or_else(|| self.src_width.saturating_mul(self.bits_per_pixel / 8))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        defaults::default_display_config()
    }
}

/// Parameters of the moving-bar demo.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    #[serde(default = "defaults::default_bar_width")]
    pub bar_width: u32,
    #[serde(default = "defaults::default_passes")]
    pub passes: u32,
    /// RGB565 color of the bar.
    #[serde(default = "defaults::default_bar_color")]
    pub bar_color: u16,
    /// Interval between simulated vertical syncs.
    #[serde(default = "defaults::default_vsync_interval_ms")]
    pub vsync_interval_ms: u64,
    /// Size of the simulated display.
    #[serde(default = "defaults::default_display_width")]
    pub display_width: u32,
    #[serde(default = "defaults::default_display_height")]
    pub display_height: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        defaults::default_demo_config()
    }
}

/// Root configuration structure.
///
/// ```
/// use triflip_core::config::CoreConfig;
///
/// let config: CoreConfig = toml::from_str(r#"
/// [logging]
/// level = "warn"
///
/// [display]
/// src_width = 320
/// src_height = 240
/// keep_aspect = true
/// "#).unwrap();
/// assert_eq!(config.logging.level, "warn");
/// assert_eq!(config.display.src_width, 320);
/// assert_eq!(config.display.content_pages, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logging_config_default_values() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.file_path, None);
        assert_eq!(config.format, "text");
    }

    #[test]
    fn test_display_config_default_values() {
        let config = DisplayConfig::default();
        assert_eq!(config.src_width, 384);
        assert_eq!(config.src_height, 118);
        assert_eq!(config.bits_per_pixel, 16);
        assert_eq!(config.visible_pitch, None);
        assert_eq!(config.effective_pitch(), 768);
        assert!(!config.keep_aspect);
        assert_eq!(config.content_pages, 3);
        assert_eq!(config.opacity, 255);
    }

    #[test]
    fn test_core_config_deserialize_empty() {
        let config: CoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_display_config_explicit_pitch() {
        let config: DisplayConfig = toml::from_str(
            r#"
            src_width = 256
            bits_per_pixel = 32
            visible_pitch = 2048
            "#,
        )
        .unwrap();
        assert_eq!(config.effective_pitch(), 2048);
        assert_eq!(config.src_height, defaults::default_src_height());
    }

    #[test]
    fn test_demo_config_partial() {
        let config: CoreConfig = toml::from_str("[demo]\npasses = 5\n").unwrap();
        assert_eq!(config.demo.passes, 5);
        assert_eq!(config.demo.bar_width, defaults::default_bar_width());
        assert_eq!((config.demo.display_width, config.demo.display_height), (1920, 1080));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<CoreConfig, _> = toml::from_str("[display]\nrefresh = 60\n");
        assert!(result.is_err());
        let result: Result<CoreConfig, _> = toml::from_str("[plugins]\n");
        assert!(result.is_err());
    }
}
