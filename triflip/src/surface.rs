//! Surfaces: a page pool bound to one on-screen element.

use std::sync::Arc;

use triflip_compositor::{
    BufferHandle, CompletionToken, Compositor, DisplayHandle, ElementAlpha, ElementHandle, ElementSpec,
};
use triflip_core::{fit_to_display, AspectRatio, PixelFormat, RectInt, SizeInt};

use crate::error::{FlipError, Result};
use crate::page::{PagePool, PageRef, SurfaceId};
use crate::sync::{Drained, PageFlipSynchronizer};

/// Everything needed to set up a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDescriptor {
    pub src_width: u32,
    pub src_height: u32,
    pub bits_per_pixel: u32,
    /// Bytes between the starts of consecutive source rows.
    pub visible_pitch: u32,
    /// Aspect ratio the destination rectangle preserves.
    pub aspect: AspectRatio,
    pub layer: i32,
    pub opacity: u8,
    pub page_count: usize,
}

impl SurfaceDescriptor {
    /// The single-page, bottom-layer surface that hides whatever was on
    /// screen before. Two pixels is the smallest write compositors accept.
    pub fn blanking(display_aspect: AspectRatio) -> Self {
        Self {
            src_width: 2,
            src_height: 2,
            bits_per_pixel: 16,
            visible_pitch: 4,
            aspect: display_aspect,
            layer: -1,
            opacity: u8::MAX,
            page_count: 1,
        }
    }
}

/// Geometry shared by every page of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub format: PixelFormat,
    pub src_size: SizeInt,
    pub pitch: u32,
    /// Backing buffer size: the pitch in whole pixels by the source height.
    pub buffer_size: SizeInt,
    /// Region of each buffer frames are written to.
    pub bmp_rect: RectInt,
    /// Source rectangle in 16.16 fixed point.
    pub src_rect: RectInt,
    /// Destination rectangle on the display.
    pub dst_rect: RectInt,
}

impl SurfaceGeometry {
    /// Validates `descriptor` and lays it out on a display of `display` pixels.
    pub fn compute(descriptor: &SurfaceDescriptor, display: SizeInt) -> Result<Self> {
        let src_size = SizeInt::new(descriptor.src_width, descriptor.src_height);
        if src_size.is_empty() {
            return Err(FlipError::InvalidDimensions {
                width: src_size.width,
                height: src_size.height,
            });
        }
        if display.is_empty() {
            return Err(FlipError::InvalidDimensions {
                width: display.width,
                height: display.height,
            });
        }
        let format = PixelFormat::from_bits_per_pixel(descriptor.bits_per_pixel)
            .ok_or(FlipError::UnsupportedDepth(descriptor.bits_per_pixel))?;
        let bytes_per_pixel = format.bytes_per_pixel();
        let pitch = descriptor.visible_pitch;
        let row_bytes = u64::from(src_size.width) * u64::from(bytes_per_pixel);
        if pitch % bytes_per_pixel != 0 || u64::from(pitch) < row_bytes {
            return Err(FlipError::InvalidPitch {
                pitch,
                width: src_size.width,
                bytes_per_pixel,
            });
        }
        if descriptor.page_count == 0 {
            return Err(FlipError::InvalidPageCount(descriptor.page_count));
        }

        let bmp_rect = RectInt::from_size(src_size);
        Ok(Self {
            format,
            src_size,
            pitch,
            buffer_size: SizeInt::new(pitch / bytes_per_pixel, src_size.height),
            bmp_rect,
            src_rect: bmp_rect.to_fixed_16_16(),
            dst_rect: fit_to_display(display, descriptor.aspect),
        })
    }

    /// Bytes a frame must hold: every row at `pitch`, the last one only up
    /// to the visible width.
    pub fn frame_len(&self) -> usize {
        let row_bytes = self.src_size.width as usize * self.format.bytes_per_pixel() as usize;
        (self.src_size.height as usize - 1) * self.pitch as usize + row_bytes
    }
}

/// A fixed pool of pages shown through one compositor element.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    layer: i32,
    geometry: SurfaceGeometry,
    pool: Arc<PagePool>,
    element: ElementHandle,
}

impl Surface {
    /// Allocates the page buffers and places the element on `page 0`.
    ///
    /// On failure everything allocated so far is released again.
    pub fn create(
        compositor: &dyn Compositor,
        display: DisplayHandle,
        display_size: SizeInt,
        descriptor: &SurfaceDescriptor,
    ) -> Result<Self> {
        let geometry = SurfaceGeometry::compute(descriptor, display_size)?;
        let id = SurfaceId::new_unique();

        let mut buffers = Vec::with_capacity(descriptor.page_count);
        for _ in 0..descriptor.page_count {
            match compositor.create_buffer(geometry.format, geometry.buffer_size.width, geometry.buffer_size.height) {
                Ok(buffer) => buffers.push(buffer),
                Err(e) => {
                    tracing::warn!(surface = ?id, allocated = buffers.len(), "Page buffer allocation failed: {}", e);
                    delete_buffers(compositor, &buffers);
                    return Err(e.into());
                }
            }
        }

        let spec = ElementSpec {
            layer: descriptor.layer,
            dst: geometry.dst_rect,
            buffer: buffers[0],
            src: geometry.src_rect,
            alpha: ElementAlpha::fixed(descriptor.opacity),
        };
        let element = match compositor.add_element(display, &spec) {
            Ok(element) => element,
            Err(e) => {
                delete_buffers(compositor, &buffers);
                return Err(e.into());
            }
        };

        tracing::debug!(
            surface = ?id,
            format = %geometry.format,
            pages = buffers.len(),
            layer = descriptor.layer,
            dst = ?geometry.dst_rect,
            "Surface created"
        );
        Ok(Self {
            id,
            layer: descriptor.layer,
            geometry,
            pool: Arc::new(PagePool::new(id, &buffers)),
            element,
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn element(&self) -> ElementHandle {
        self.element
    }

    pub fn page_count(&self) -> usize {
        self.pool.len()
    }

    pub fn page_buffer(&self, index: usize) -> Option<BufferHandle> {
        self.pool.page(index).map(|page| page.buffer())
    }

    pub fn page_in_use(&self, index: usize) -> bool {
        self.pool.page(index).map_or(false, |page| page.is_used())
    }

    /// The page on screen, once the first flip has completed.
    pub fn current_page(&self) -> Option<PageRef> {
        self.pool
            .current()
            .and_then(|index| self.pool.page(index))
            .map(|page| page.owner())
    }

    /// Writes `pixels` into a free page and flips the element to it.
    ///
    /// Blocks while another flip is pending and while no page is free.
    /// Returns once the flip is submitted, without waiting for it to land.
    pub fn submit_frame(
        &self,
        compositor: &dyn Compositor,
        sync: &Arc<PageFlipSynchronizer>,
        pixels: &[u8],
    ) -> Result<PageRef> {
        let slot = sync.wait_for_flip_slot();
        let index = sync.acquire_free_page(&self.pool);

        if let Err(e) = self.flip_to(compositor, sync, index, pixels) {
            // The update never reached the compositor: hand the page back and
            // let the slot roll back on drop.
            if let Some(page) = self.pool.page(index) {
                page.release();
            }
            sync.notify_page_freed();
            tracing::warn!(surface = ?self.id, index, "Frame submission failed: {}", e);
            return Err(e);
        }
        slot.commit();
        sync.stats().record_submit();

        let page = PageRef {
            surface: self.id,
            index,
        };
        tracing::trace!(surface = ?self.id, index, "Frame submitted");
        Ok(page)
    }

    fn flip_to(
        &self,
        compositor: &dyn Compositor,
        sync: &Arc<PageFlipSynchronizer>,
        index: usize,
        pixels: &[u8],
    ) -> Result<()> {
        let buffer = self.pool.pages()[index].buffer();
        compositor.write_pixels(
            buffer,
            self.geometry.format,
            self.geometry.pitch,
            pixels,
            self.geometry.bmp_rect,
        )?;
        compositor.retarget(self.element, buffer)?;

        let pool = Arc::clone(&self.pool);
        let sync = Arc::clone(sync);
        if let Err(e) = compositor.submit_update(CompletionToken::new(move || sync.on_flip_complete(&pool, index))) {
            self.restage_shown_page(compositor);
            return Err(e.into());
        }
        Ok(())
    }

    /// Points the staged retarget back at the page on screen, so the next
    /// update on this compositor does not show a page that is being freed.
    fn restage_shown_page(&self, compositor: &dyn Compositor) {
        let shown = self.pool.current().unwrap_or(0);
        if let Some(page) = self.pool.page(shown) {
            if let Err(e) = compositor.retarget(self.element, page.buffer()) {
                tracing::warn!(surface = ?self.id, index = shown, "Failed to restage shown page: {}", e);
            }
        }
    }

    /// Removes the element and deletes every page buffer.
    ///
    /// Teardown continues past failures; the first one is returned.
    pub fn destroy(self, compositor: &dyn Compositor, drained: &Drained) -> Result<()> {
        self.release(compositor, drained)
    }

    pub(crate) fn release(&self, compositor: &dyn Compositor, _drained: &Drained) -> Result<()> {
        let mut first_error = compositor.remove_element(self.element).err();
        for page in self.pool.pages() {
            if let Err(e) = compositor.delete_buffer(page.buffer()) {
                tracing::warn!(surface = ?self.id, buffer = %page.buffer(), "Failed to delete page buffer: {}", e);
                first_error.get_or_insert(e);
            }
        }
        tracing::debug!(surface = ?self.id, "Surface destroyed");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn delete_buffers(compositor: &dyn Compositor, buffers: &[BufferHandle]) {
    for buffer in buffers {
        if let Err(e) = compositor.delete_buffer(*buffer) {
            tracing::warn!(%buffer, "Failed to release buffer during rollback: {}", e);
        }
    }
}
