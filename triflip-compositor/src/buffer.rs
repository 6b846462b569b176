//! Pixel storage for the software compositor.

use std::collections::HashMap;

use triflip_core::{PixelFormat, RectInt, SizeInt};

use crate::error::{CompositorError, Result};
use crate::handle::BufferHandle;

/// A compositor-owned pixel buffer.
#[derive(Debug)]
pub struct BufferDetails {
    /// Unique identifier for this buffer.
    pub handle: BufferHandle,
    /// Pixel format of the buffer.
    pub format: PixelFormat,
    /// Width of the buffer in pixels.
    pub width: u32,
    /// Height of the buffer in pixels.
    pub height: u32,
    /// Bytes per row.
    pub stride: u32,
    pixels: Vec<u8>,
}

impl BufferDetails {
    /// Allocates a zero-filled buffer with a tightly packed stride.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CompositorError::InvalidBufferSize { width, height });
        }
        let stride = width
            .checked_mul(format.bytes_per_pixel())
            .ok_or(CompositorError::InvalidBufferSize { width, height })?;
        let len = (stride as usize)
            .checked_mul(height as usize)
            .ok_or(CompositorError::InvalidBufferSize { width, height })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|e| CompositorError::AllocationFailed(e.to_string()))?;
        pixels.resize(len, 0);

        Ok(Self {
            handle: BufferHandle::new_unique(),
            format,
            width,
            height,
            stride,
            pixels,
        })
    }

    pub fn size(&self) -> SizeInt {
        SizeInt::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copies `region` of an image into the same region of this buffer.
    ///
    /// `data` holds the whole source image with rows `pitch` bytes apart, so
    /// row `r` of the buffer is read from offset `r * pitch` in `data`.
    pub fn write_region(&mut self, format: PixelFormat, pitch: u32, data: &[u8], region: RectInt) -> Result<()> {
        if format != self.format {
            return Err(CompositorError::FormatMismatch {
                buffer: self.handle,
                expected: self.format,
                actual: format,
            });
        }
        if region.size.area() < 2 {
            return Err(CompositorError::RegionTooSmall { region });
        }
        if region.x() < 0 || region.y() < 0 || !RectInt::from_size(self.size()).contains_rect(&region) {
            return Err(CompositorError::RegionOutOfBounds {
                region,
                width: self.width,
                height: self.height,
            });
        }

        let bpp = format.bytes_per_pixel() as usize;
        let pitch = pitch as usize;
        let x = region.x() as usize;
        let y = region.y() as usize;
        let row_len = region.width() as usize * bpp;
        let last_row = y + region.height() as usize - 1;
        let needed = last_row * pitch + x * bpp + row_len;
        if data.len() < needed || pitch < x * bpp + row_len {
            return Err(CompositorError::ShortPixelData {
                needed: needed.max(x * bpp + row_len),
                actual: data.len(),
            });
        }

        let stride = self.stride as usize;
        for row in y..=last_row {
            let src = row * pitch + x * bpp;
            let dst = row * stride + x * bpp;
            self.pixels[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
        }
        Ok(())
    }
}

/// Tracks the buffers allocated through one compositor connection.
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: HashMap<BufferHandle, BufferDetails>,
    created: u64,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates and registers a new buffer.
    pub fn register(&mut self, format: PixelFormat, width: u32, height: u32) -> Result<BufferHandle> {
        let details = BufferDetails::new(format, width, height)?;
        let handle = details.handle;
        self.buffers.insert(handle, details);
        self.created += 1;
        Ok(handle)
    }

    pub fn get(&self, handle: BufferHandle) -> Result<&BufferDetails> {
        self.buffers.get(&handle).ok_or(CompositorError::UnknownBuffer(handle))
    }

    pub fn get_mut(&mut self, handle: BufferHandle) -> Result<&mut BufferDetails> {
        self.buffers.get_mut(&handle).ok_or(CompositorError::UnknownBuffer(handle))
    }

    pub fn contains(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    /// Removes a buffer, returning its storage.
    pub fn release(&mut self, handle: BufferHandle) -> Result<BufferDetails> {
        self.buffers.remove(&handle).ok_or(CompositorError::UnknownBuffer(handle))
    }

    /// Number of buffers currently allocated.
    pub fn live(&self) -> usize {
        self.buffers.len()
    }

    /// Number of buffers ever allocated.
    pub fn created(&self) -> u64 {
        self.created
    }
}
