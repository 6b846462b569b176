//! Errors reported by [`crate::Compositor`] implementations.

use thiserror::Error;
use triflip_core::{PixelFormat, RectInt};

use crate::handle::{BufferHandle, DisplayHandle, ElementHandle};

/// Failure of a single compositor request.
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Display {0} is already open on this connection")]
    DisplayBusy(u32),

    #[error("Unknown display handle {0:?}")]
    UnknownDisplay(DisplayHandle),

    #[error("Unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),

    #[error("Unknown element handle {0:?}")]
    UnknownElement(ElementHandle),

    #[error("Invalid buffer size {width}x{height}")]
    InvalidBufferSize { width: u32, height: u32 },

    #[error("Buffer {buffer:?} holds {expected} pixels, not {actual}")]
    FormatMismatch {
        buffer: BufferHandle,
        expected: PixelFormat,
        actual: PixelFormat,
    },

    #[error("Write region {region:?} must cover at least two pixels")]
    RegionTooSmall { region: RectInt },

    #[error("Write region {region:?} exceeds buffer bounds {width}x{height}")]
    RegionOutOfBounds { region: RectInt, width: u32, height: u32 },

    #[error("Pixel data too short: need {needed} bytes, got {actual}")]
    ShortPixelData { needed: usize, actual: usize },

    #[error("An update is already waiting for vertical sync")]
    UpdatePending,

    #[error("Buffer allocation failed: {0}")]
    AllocationFailed(String),

    #[error("Failed to start the vsync thread: {0}")]
    VsyncThread(#[from] std::io::Error),
}

pub type Result<T, E = CompositorError> = std::result::Result<T, E>;
