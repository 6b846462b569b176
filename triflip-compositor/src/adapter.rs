//! The compositor seam the page-flip scheduler drives.
//!
//! A [`Compositor`] owns displays, pixel buffers and layered elements. Buffer
//! changes are staged with [`Compositor::retarget`] and become visible
//! together when an update is submitted and the display reaches its next
//! vertical sync. At that point the update's [`CompletionToken`] is fired,
//! exactly once, on a thread owned by the compositor.

use std::fmt;

use triflip_core::{PixelFormat, RectInt, SizeInt};

use crate::error::Result;
use crate::handle::{BufferHandle, DisplayHandle, ElementHandle};

/// One opacity applied to every pixel of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementAlpha {
    pub opacity: u8,
}

impl ElementAlpha {
    pub const fn fixed(opacity: u8) -> Self {
        Self { opacity }
    }
}

impl Default for ElementAlpha {
    fn default() -> Self {
        Self::fixed(u8::MAX)
    }
}

/// Placement of a new element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    /// Stacking order; higher layers are drawn on top.
    pub layer: i32,
    /// Destination rectangle in display pixels.
    pub dst: RectInt,
    /// Buffer shown until the element is retargeted.
    pub buffer: BufferHandle,
    /// Source rectangle in 16.16 fixed point.
    pub src: RectInt,
    pub alpha: ElementAlpha,
}

/// One-shot callback fired when a submitted update reaches the screen.
pub struct CompletionToken {
    callback: Box<dyn FnOnce() + Send + 'static>,
}

impl CompletionToken {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Runs the callback. Consumes the token so it cannot fire twice.
    pub fn fire(self) {
        (self.callback)()
    }
}

impl fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionToken").finish_non_exhaustive()
    }
}

/// A display compositor reachable from any thread.
///
/// Implementations must never fire a [`CompletionToken`] from inside
/// [`Compositor::submit_update`]; completions arrive asynchronously.
pub trait Compositor: Send + Sync {
    /// Opens display `id`. A connection holds at most one open display.
    fn open_display(&self, id: u32) -> Result<DisplayHandle>;

    /// Physical size of an open display in pixels.
    fn display_size(&self, display: DisplayHandle) -> Result<SizeInt>;

    fn close_display(&self, display: DisplayHandle) -> Result<()>;

    /// Allocates a zero-filled buffer.
    fn create_buffer(&self, format: PixelFormat, width: u32, height: u32) -> Result<BufferHandle>;

    fn delete_buffer(&self, buffer: BufferHandle) -> Result<()>;

    /// Copies `region` of an image with rows `pitch` bytes apart into `buffer`.
    fn write_pixels(
        &self,
        buffer: BufferHandle,
        format: PixelFormat,
        pitch: u32,
        data: &[u8],
        region: RectInt,
    ) -> Result<()>;

    /// Places an element on an open display. Takes effect immediately.
    fn add_element(&self, display: DisplayHandle, spec: &ElementSpec) -> Result<ElementHandle>;

    fn remove_element(&self, element: ElementHandle) -> Result<()>;

    /// Stages `element` to show `buffer` from the next submitted update on.
    ///
    /// A later retarget of the same element replaces the staged one. A
    /// rejected update leaves staged changes in place.
    fn retarget(&self, element: ElementHandle, buffer: BufferHandle) -> Result<()>;

    /// Submits all staged changes. `token` fires once they are on screen.
    ///
    /// At most one update may be outstanding per connection.
    fn submit_update(&self, token: CompletionToken) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_completion_token_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let token = CompletionToken::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        token.fire();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_token_never_fires() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        drop(CompletionToken::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_alpha_is_opaque() {
        assert_eq!(ElementAlpha::default(), ElementAlpha::fixed(255));
        assert_eq!(ElementAlpha::default().opacity, u8::MAX);
    }
}
