//! Pages and the per-surface page pool.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use triflip_compositor::BufferHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn new_unique() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Non-owning reference to a page: the surface that owns it and its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub surface: SurfaceId,
    pub index: usize,
}

/// One backing buffer plus its in-use flag.
///
/// `used` only changes under the page's own lock.
#[derive(Debug)]
pub struct Page {
    buffer: BufferHandle,
    owner: PageRef,
    used: Mutex<bool>,
}

impl Page {
    pub fn new(buffer: BufferHandle, owner: PageRef) -> Self {
        Self {
            buffer,
            owner,
            used: Mutex::new(false),
        }
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    pub fn owner(&self) -> PageRef {
        self.owner
    }

    pub fn is_used(&self) -> bool {
        *self.used.lock()
    }

    /// Marks the page used if it was free. Returns whether it was claimed.
    pub(crate) fn try_claim(&self) -> bool {
        let mut used = self.used.lock();
        if *used {
            false
        } else {
            *used = true;
            true
        }
    }

    pub(crate) fn release(&self) {
        *self.used.lock() = false;
    }
}

/// Fixed-size arena of pages belonging to one surface.
#[derive(Debug)]
pub struct PagePool {
    surface: SurfaceId,
    pages: Box<[Page]>,
    /// Index of the page on screen.
    current: Mutex<Option<usize>>,
}

impl PagePool {
    /// Builds a pool with one free page per buffer, in order.
    pub fn new(surface: SurfaceId, buffers: &[BufferHandle]) -> Self {
        let pages = buffers
            .iter()
            .enumerate()
            .map(|(index, buffer)| Page::new(*buffer, PageRef { surface, index }))
            .collect();
        Self {
            surface,
            pages,
            current: Mutex::new(None),
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current(&self) -> Option<usize> {
        *self.current.lock()
    }

    /// Claims the first free page, scanning in order.
    pub(crate) fn claim_free(&self) -> Option<usize> {
        self.pages.iter().position(Page::try_claim)
    }

    /// Frees the page being replaced on screen, then makes `index` current.
    ///
    /// A single-page pool frees its only page as soon as it is shown, since
    /// there is never a later flip that could replace it.
    pub(crate) fn promote(&self, index: usize) -> Option<usize> {
        let mut current = self.current.lock();
        let previous = *current;
        if let Some(prev) = previous {
            if prev != index {
                if let Some(page) = self.pages.get(prev) {
                    page.release();
                }
            }
        }
        *current = Some(index);
        if self.pages.len() == 1 {
            if let Some(page) = self.pages.get(index) {
                page.release();
            }
        }
        previous
    }
}
