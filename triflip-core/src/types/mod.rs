//! Core data types shared by the triflip crates.
//!
//! - **Geometry**: [`PointInt`], [`SizeInt`], [`RectInt`], [`AspectRatio`] and
//!   the [`fit_to_display`] helper that computes destination rectangles.
//! - **Pixel formats**: [`PixelFormat`], selected from a color depth.

pub mod geometry;
pub mod pixel_format;

pub use self::geometry::{fit_to_display, AspectRatio, PointInt, RectInt, SizeInt};
pub use self::pixel_format::PixelFormat;
