//! Integer geometry primitives and destination-rectangle fitting.

use serde::{Deserialize, Serialize};

/// An integer point with `i32` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointInt {
    pub x: i32,
    pub y: i32,
}

impl PointInt {
    /// Creates a new `PointInt`.
    pub const fn new(x: i32, y: i32) -> Self {
        PointInt { x, y }
    }
}

/// An integer size with `u32` dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SizeInt {
    pub width: u32,
    pub height: u32,
}

impl SizeInt {
    /// Creates a new `SizeInt`.
    pub const fn new(width: u32, height: u32) -> Self {
        SizeInt { width, height }
    }

    /// Checks if the area is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered by this size.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// An integer rectangle with `i32` origin and `u32` size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RectInt {
    /// The origin point (top-left corner) of the rectangle.
    pub origin: PointInt,
    /// The size (width and height) of the rectangle.
    pub size: SizeInt,
}

impl RectInt {
    /// Creates a new `RectInt` from an origin point and a size.
    pub const fn new(origin: PointInt, size: SizeInt) -> Self {
        RectInt { origin, size }
    }

    /// Creates a new `RectInt` from individual coordinate and dimension values.
    pub const fn from_coords(x: i32, y: i32, width: u32, height: u32) -> Self {
        RectInt {
            origin: PointInt::new(x, y),
            size: SizeInt::new(width, height),
        }
    }

    /// A rectangle at the origin with the given size.
    pub const fn from_size(size: SizeInt) -> Self {
        RectInt { origin: PointInt::new(0, 0), size }
    }

    pub fn x(&self) -> i32 { self.origin.x }
    pub fn y(&self) -> i32 { self.origin.y }
    pub fn width(&self) -> u32 { self.size.width }
    pub fn height(&self) -> u32 { self.size.height }

    /// Calculates the x-coordinate of the right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width as i32
    }

    /// Calculates the y-coordinate of the bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &RectInt) -> bool {
        other.origin.x >= self.origin.x
            && other.origin.y >= self.origin.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Converts a pixel rectangle into the 16.16 fixed-point form compositors
    /// use for source rectangles.
    pub fn to_fixed_16_16(&self) -> RectInt {
        RectInt::from_coords(
            self.origin.x << 16,
            self.origin.y << 16,
            self.size.width << 16,
            self.size.height << 16,
        )
    }
}

/// Width-over-height ratio used to fit a frame onto the display.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AspectRatio(f32);

impl AspectRatio {
    /// Returns `None` unless `ratio` is finite and positive.
    pub fn new(ratio: f32) -> Option<Self> {
        (ratio.is_finite() && ratio > 0.0).then_some(AspectRatio(ratio))
    }

    pub fn from_size(size: SizeInt) -> Option<Self> {
        if size.is_empty() {
            return None;
        }
        Self::new(size.width as f32 / size.height as f32)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

/// Scales a frame of the given aspect ratio to the full display height,
/// clamps the resulting width to the display width and centers it.
///
/// Widths are truncated toward zero after scaling.
pub fn fit_to_display(display: SizeInt, aspect: AspectRatio) -> RectInt {
    let scaled_width = (display.height as f32 * aspect.value()) as u32;
    let width = scaled_width.min(display.width);
    let height = display.height;

    let x = (display.width - width) / 2;
    let y = (display.height - height) / 2;
    RectInt::from_coords(x as i32, y as i32, width, height)
}
