//! Default configuration values.
//!
//! These functions back the `#[serde(default = "...")]` attributes in
//! [`super::types`].

use super::types::{DemoConfig, DisplayConfig, LoggingConfig};
use std::path::PathBuf;

pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_display_config() -> DisplayConfig {
    DisplayConfig {
        display_id: default_display_id(),
        src_width: default_src_width(),
        src_height: default_src_height(),
        bits_per_pixel: default_bits_per_pixel(),
        visible_pitch: None,
        keep_aspect: false,
        content_pages: default_content_pages(),
        opacity: default_opacity(),
    }
}

/// The main LCD.
pub(super) fn default_display_id() -> u32 {
    0
}

pub(super) fn default_src_width() -> u32 {
    384
}

pub(super) fn default_src_height() -> u32 {
    118
}

pub(super) fn default_bits_per_pixel() -> u32 {
    16
}

/// Triple buffering.
pub(super) fn default_content_pages() -> usize {
    3
}

/// Fully opaque.
pub(super) fn default_opacity() -> u8 {
    255
}

pub(super) fn default_demo_config() -> DemoConfig {
    DemoConfig {
        bar_width: default_bar_width(),
        passes: default_passes(),
        bar_color: default_bar_color(),
        vsync_interval_ms: default_vsync_interval_ms(),
        display_width: default_display_width(),
        display_height: default_display_height(),
    }
}

pub(super) fn default_bar_width() -> u32 {
    50
}

pub(super) fn default_passes() -> u32 {
    2
}

pub(super) fn default_bar_color() -> u16 {
    0x0FF0
}

/// Roughly 60 Hz.
pub(super) fn default_vsync_interval_ms() -> u64 {
    16
}

pub(super) fn default_display_width() -> u32 {
    1920
}

pub(super) fn default_display_height() -> u32 {
    1080
}
