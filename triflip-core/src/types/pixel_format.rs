//! Pixel formats understood by the page-flip pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of one pixel in a backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8 bits per pixel, palette indexed.
    Indexed8,
    /// 16 bits per pixel, 5-6-5 RGB.
    Rgb565,
    /// 32 bits per pixel, 8-8-8 RGB with an unused padding byte.
    Xrgb8888,
}

impl PixelFormat {
    /// Maps a color depth in bits to a pixel format.
    ///
    /// Only 8, 16 and 32 bit depths are supported.
    pub fn from_bits_per_pixel(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(PixelFormat::Indexed8),
            16 => Some(PixelFormat::Rgb565),
            32 => Some(PixelFormat::Xrgb8888),
            _ => None,
        }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Indexed8 => 8,
            PixelFormat::Rgb565 => 16,
            PixelFormat::Xrgb8888 => 32,
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_pixel() / 8
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Indexed8 => "8bpp-indexed",
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Xrgb8888 => "xrgb8888",
        };
        f.write_str(name)
    }
}
