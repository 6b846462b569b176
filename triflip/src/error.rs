//! Error type for the page-flip scheduler.

use thiserror::Error;
use triflip_compositor::CompositorError;

/// Setup and submission failures.
///
/// A compositor that never completes a submitted flip is not an error: it
/// shows up as a producer blocked in [`crate::Surface::submit_frame`].
#[derive(Debug, Error)]
pub enum FlipError {
    #[error("Unsupported bit depth {0}; expected 8, 16 or 32")]
    UnsupportedDepth(u32),

    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid pitch {pitch} for {width} pixels of {bytes_per_pixel} bytes")]
    InvalidPitch {
        pitch: u32,
        width: u32,
        bytes_per_pixel: u32,
    },

    #[error("A surface needs at least one page, got {0}")]
    InvalidPageCount(usize),

    #[error("A display context is already live on this compositor connection")]
    AlreadyInitialized,

    #[error("Compositor request failed: {0}")]
    Compositor(#[from] CompositorError),
}

pub type Result<T, E = FlipError> = std::result::Result<T, E>;
