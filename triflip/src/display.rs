//! The display context: one compositor connection with its surfaces.

use std::fmt;
use std::sync::Arc;

use triflip_compositor::{Compositor, CompositorError, DisplayHandle};
use triflip_core::{AspectRatio, DisplayConfig, SizeInt};

use crate::error::{FlipError, Result};
use crate::page::PageRef;
use crate::stats::FlipStatsSnapshot;
use crate::surface::{Surface, SurfaceDescriptor};
use crate::sync::PageFlipSynchronizer;

/// Selects one of the context's surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// The single-page surface below the content that hides the console.
    Blanking,
    /// The multi-buffered surface frames are presented on.
    Content,
}

/// An open display with a blanking surface and a content surface.
///
/// Created by [`DisplayContext::init`] and torn down by
/// [`DisplayContext::shutdown`]. A context dropped without `shutdown` tears
/// itself down the same way and logs any failure. Only one context can be
/// live per compositor connection. All methods take `&self`, so several
/// producer threads may present frames through a shared reference; flips are
/// still serialized.
pub struct DisplayContext {
    compositor: Arc<dyn Compositor>,
    display: DisplayHandle,
    display_size: SizeInt,
    sync: Arc<PageFlipSynchronizer>,
    blanking: Surface,
    content: Surface,
    live: bool,
}

impl DisplayContext {
    /// Opens the display and sets up both surfaces.
    ///
    /// The blanking surface is shown with an all-black frame before this
    /// returns. On failure everything acquired so far is released.
    ///
    /// # Errors
    ///
    /// - [`FlipError::AlreadyInitialized`] if the connection already hosts a live context.
    /// - A configuration error for unusable geometry.
    /// - [`FlipError::Compositor`] if a compositor request fails.
    pub fn init(compositor: Arc<dyn Compositor>, config: &DisplayConfig) -> Result<Self> {
        let display = compositor.open_display(config.display_id).map_err(|e| match e {
            CompositorError::DisplayBusy(_) => FlipError::AlreadyInitialized,
            other => FlipError::from(other),
        })?;

        let mut context = match Self::setup(Arc::clone(&compositor), display, config) {
            Ok(context) => context,
            Err(e) => {
                if let Err(close_err) = compositor.close_display(display) {
                    tracing::warn!("Failed to close display after setup error: {}", close_err);
                }
                return Err(e);
            }
        };

        let black = vec![0u8; context.blanking.geometry().frame_len()];
        if let Err(e) = context.present_frame_on(SurfaceKind::Blanking, &black) {
            if let Err(teardown_err) = context.teardown() {
                tracing::warn!("Failed to tear down display after setup error: {}", teardown_err);
            }
            return Err(e);
        }

        tracing::info!(
            display_id = config.display_id,
            size = ?context.display_size,
            pages = context.content.page_count(),
            "Display context initialized"
        );
        Ok(context)
    }

    fn setup(compositor: Arc<dyn Compositor>, display: DisplayHandle, config: &DisplayConfig) -> Result<Self> {
        let display_size = compositor.display_size(display)?;
        let display_aspect = AspectRatio::from_size(display_size).ok_or(FlipError::InvalidDimensions {
            width: display_size.width,
            height: display_size.height,
        })?;
        let content_descriptor = content_descriptor(config, display_aspect)?;
        let sync = Arc::new(PageFlipSynchronizer::new());

        let blanking = Surface::create(
            &*compositor,
            display,
            display_size,
            &SurfaceDescriptor::blanking(display_aspect),
        )?;
        let content = match Surface::create(&*compositor, display, display_size, &content_descriptor) {
            Ok(content) => content,
            Err(e) => {
                if let Err(destroy_err) = blanking.destroy(&*compositor, &sync.wait_until_drained()) {
                    tracing::warn!("Failed to destroy blanking surface after setup error: {}", destroy_err);
                }
                return Err(e);
            }
        };

        Ok(Self {
            compositor,
            display,
            display_size,
            sync,
            blanking,
            content,
            live: true,
        })
    }

    /// Presents a frame on the content surface.
    ///
    /// `pixels` holds `src_height` rows, `visible_pitch` bytes apart.
    pub fn present_frame(&self, pixels: &[u8]) -> Result<PageRef> {
        self.present_frame_on(SurfaceKind::Content, pixels)
    }

    pub fn present_frame_on(&self, kind: SurfaceKind, pixels: &[u8]) -> Result<PageRef> {
        self.surface(kind).submit_frame(&*self.compositor, &self.sync, pixels)
    }

    pub fn surface(&self, kind: SurfaceKind) -> &Surface {
        match kind {
            SurfaceKind::Blanking => &self.blanking,
            SurfaceKind::Content => &self.content,
        }
    }

    pub fn display(&self) -> DisplayHandle {
        self.display
    }

    pub fn display_size(&self) -> SizeInt {
        self.display_size
    }

    /// Flips submitted but not yet completed: 0 or 1.
    pub fn pending_flips(&self) -> u32 {
        self.sync.pending()
    }

    pub fn stats(&self) -> FlipStatsSnapshot {
        self.sync.stats().snapshot()
    }

    /// Waits for outstanding flips, destroys both surfaces and closes the
    /// display.
    ///
    /// Blocks for as long as the compositor withholds a completion. Teardown
    /// continues past individual failures and reports the first one.
    pub fn shutdown(mut self) -> Result<FlipStatsSnapshot> {
        let result = self.teardown();
        let stats = self.sync.stats().snapshot();
        tracing::info!(
            frames_submitted = stats.frames_submitted,
            flips_completed = stats.flips_completed,
            page_waits = stats.page_waits,
            "Display context shut down"
        );
        result.map(|()| stats)
    }

    /// Releases the surfaces and the display once; later calls do nothing.
    fn teardown(&mut self) -> Result<()> {
        if !self.live {
            return Ok(());
        }
        self.live = false;

        let drained = self.sync.wait_until_drained();
        let mut first_error = self.content.release(&*self.compositor, &drained).err();
        if let Err(e) = self.blanking.release(&*self.compositor, &drained) {
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.compositor.close_display(self.display) {
            first_error.get_or_insert(e.into());
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for DisplayContext {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        tracing::warn!(display = %self.display, "Display context dropped without shutdown, tearing down");
        if let Err(e) = self.teardown() {
            tracing::warn!("Failed to tear down dropped display context: {}", e);
        }
    }
}

impl fmt::Debug for DisplayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayContext")
            .field("display", &self.display)
            .field("display_size", &self.display_size)
            .field("blanking", &self.blanking)
            .field("content", &self.content)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

fn content_descriptor(config: &DisplayConfig, display_aspect: AspectRatio) -> Result<SurfaceDescriptor> {
    let aspect = if config.keep_aspect {
        AspectRatio::from_size(SizeInt::new(config.src_width, config.src_height)).ok_or(
            FlipError::InvalidDimensions {
                width: config.src_width,
                height: config.src_height,
            },
        )?
    } else {
        display_aspect
    };
    Ok(SurfaceDescriptor {
        src_width: config.src_width,
        src_height: config.src_height,
        bits_per_pixel: config.bits_per_pixel,
        visible_pitch: config.effective_pitch(),
        aspect,
        layer: 0,
        opacity: config.opacity,
        page_count: config.content_pages,
    })
}
