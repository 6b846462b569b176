//! A vertical bar sweeping across the frame.

use std::ops::Range;

use triflip_core::{DisplayConfig, PixelFormat};

/// Renders frames with a solid bar at a given column on black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovingBar {
    width: u32,
    height: u32,
    pitch: u32,
    format: PixelFormat,
    bar_width: u32,
    pixel: Vec<u8>,
}

impl MovingBar {
    /// Returns `None` for a depth no surface supports.
    pub fn new(display: &DisplayConfig, bar_width: u32, rgb565: u16) -> Option<Self> {
        let format = PixelFormat::from_bits_per_pixel(display.bits_per_pixel)?;
        Some(Self {
            width: display.src_width,
            height: display.src_height,
            pitch: display.effective_pitch(),
            format,
            bar_width: bar_width.min(display.src_width),
            pixel: encode_pixel(format, rgb565),
        })
    }

    /// Left edges the bar sweeps through in one pass.
    pub fn positions(&self) -> Range<u32> {
        0..self.width - self.bar_width
    }

    /// A full frame, `height` rows `pitch` bytes apart.
    pub fn render(&self, left: u32) -> Vec<u8> {
        let bpp = self.format.bytes_per_pixel() as usize;
        let pitch = self.pitch as usize;
        let mut frame = vec![0u8; pitch * self.height as usize];

        let start = left.min(self.width) as usize;
        let end = left.saturating_add(self.bar_width).min(self.width) as usize;
        for row in frame.chunks_exact_mut(pitch) {
            for column in start..end {
                row[column * bpp..(column + 1) * bpp].copy_from_slice(&self.pixel);
            }
        }
        frame
    }
}

/// Encodes an RGB565 color as one native-endian pixel of `format`.
///
/// Indexed frames use the low byte as the palette index.
pub fn encode_pixel(format: PixelFormat, rgb565: u16) -> Vec<u8> {
    match format {
        PixelFormat::Indexed8 => vec![(rgb565 & 0xFF) as u8],
        PixelFormat::Rgb565 => rgb565.to_ne_bytes().to_vec(),
        PixelFormat::Xrgb8888 => {
            let r = u32::from((rgb565 >> 11) & 0x1F);
            let g = u32::from((rgb565 >> 5) & 0x3F);
            let b = u32::from(rgb565 & 0x1F);
            let xrgb = (((r << 3) | (r >> 2)) << 16) | (((g << 2) | (g >> 4)) << 8) | ((b << 3) | (b >> 2));
            xrgb.to_ne_bytes().to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn display(width: u32, height: u32, bits_per_pixel: u32) -> DisplayConfig {
        DisplayConfig {
            src_width: width,
            src_height: height,
            bits_per_pixel,
            ..DisplayConfig::default()
        }
    }

    #[test]
    fn test_positions_stop_before_bar_reaches_edge() {
        let bar = MovingBar::new(&display(384, 118, 16), 50, 0x0FF0).unwrap();
        assert_eq!(bar.positions(), 0..334);
    }

    #[test]
    fn test_render_rgb565_bar() {
        let bar = MovingBar::new(&display(4, 2, 16), 2, 0x0FF0).unwrap();
        let frame = bar.render(1);
        let pixels: Vec<u16> = frame
            .chunks_exact(2)
            .map(|p| u16::from_ne_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(pixels, vec![0, 0x0FF0, 0x0FF0, 0, 0, 0x0FF0, 0x0FF0, 0]);
    }

    #[test]
    fn test_render_leaves_pitch_padding_black() {
        let config = DisplayConfig {
            visible_pitch: Some(6),
            ..display(2, 2, 8)
        };
        let bar = MovingBar::new(&config, 2, 0x00AB).unwrap();
        assert_eq!(bar.render(0), vec![0xAB, 0xAB, 0, 0, 0, 0, 0xAB, 0xAB, 0, 0, 0, 0]);
    }

    #[rstest]
    #[case(0xFFFF, 0x00FF_FFFF)]
    #[case(0xF800, 0x00FF_0000)]
    #[case(0x07E0, 0x0000_FF00)]
    #[case(0x001F, 0x0000_00FF)]
    #[case(0x0000, 0)]
    fn test_encode_xrgb8888(#[case] rgb565: u16, #[case] xrgb: u32) {
        assert_eq!(encode_pixel(PixelFormat::Xrgb8888, rgb565), xrgb.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_unsupported_depth() {
        assert!(MovingBar::new(&display(4, 4, 24), 1, 0).is_none());
    }
}
