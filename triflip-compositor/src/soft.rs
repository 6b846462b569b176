//! An in-memory [`Compositor`] with a simulated vertical sync.
//!
//! [`SoftCompositor`] keeps buffers as plain byte vectors and tracks which
//! buffer each element shows. Submitted updates are applied at the next
//! vsync, which either ticks on a background thread
//! ([`VsyncMode::Interval`]) or is driven by the caller through
//! [`SoftCompositor::fire_vsync`] ([`VsyncMode::Manual`]).

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use triflip_core::{PixelFormat, RectInt, SizeInt};

use crate::adapter::{CompletionToken, Compositor, ElementSpec};
use crate::buffer::BufferStore;
use crate::error::{CompositorError, Result};
use crate::handle::{BufferHandle, DisplayHandle, ElementHandle};

/// Source of vertical sync events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsyncMode {
    /// A background thread presents pending updates once per interval.
    Interval(Duration),
    /// Updates are presented only by [`SoftCompositor::fire_vsync`].
    Manual,
}

/// Counters describing the compositor's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoftStats {
    pub open_displays: usize,
    pub live_buffers: usize,
    pub buffers_created: u64,
    pub live_elements: usize,
    pub updates_submitted: u64,
    pub updates_presented: u64,
}

/// Snapshot of a placed element. `spec.buffer` is the buffer currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    pub display: DisplayHandle,
    pub spec: ElementSpec,
}

struct PendingUpdate {
    retargets: Vec<(ElementHandle, BufferHandle)>,
    token: CompletionToken,
}

struct SoftState {
    display_size: SizeInt,
    open_display: Option<DisplayHandle>,
    buffers: BufferStore,
    elements: HashMap<ElementHandle, ElementInfo>,
    staged: Vec<(ElementHandle, BufferHandle)>,
    in_flight: Option<PendingUpdate>,
    allocations_left: Option<usize>,
    updates_submitted: u64,
    updates_presented: u64,
    stopping: bool,
}

impl SoftState {
    fn check_display(&self, display: DisplayHandle) -> Result<()> {
        match self.open_display {
            Some(open) if open == display => Ok(()),
            _ => Err(CompositorError::UnknownDisplay(display)),
        }
    }

    /// Applies the in-flight update and hands back its token.
    fn present(&mut self) -> Option<CompletionToken> {
        let update = self.in_flight.take()?;
        for (element, buffer) in update.retargets {
            // Elements removed while the update was in flight are skipped.
            if let Some(info) = self.elements.get_mut(&element) {
                info.spec.buffer = buffer;
            }
        }
        self.updates_presented += 1;
        Some(update.token)
    }
}

struct Shared {
    state: Mutex<SoftState>,
    stop_cond: Condvar,
}

/// Software compositor for tests, demos and headless runs.
pub struct SoftCompositor {
    shared: Arc<Shared>,
    vsync_thread: Option<JoinHandle<()>>,
}

impl SoftCompositor {
    /// Creates a compositor driving one display of `display_size` pixels.
    ///
    /// # Errors
    ///
    /// [`CompositorError::VsyncThread`] if the interval thread cannot be spawned.
    pub fn new(display_size: SizeInt, mode: VsyncMode) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SoftState {
                display_size,
                open_display: None,
                buffers: BufferStore::new(),
                elements: HashMap::new(),
                staged: Vec::new(),
                in_flight: None,
                allocations_left: None,
                updates_submitted: 0,
                updates_presented: 0,
                stopping: false,
            }),
            stop_cond: Condvar::new(),
        });

        let vsync_thread = match mode {
            VsyncMode::Interval(interval) => {
                let thread_shared = Arc::clone(&shared);
                let handle = thread::Builder::new()
                    .name("soft-vsync".to_string())
                    .spawn(move || vsync_loop(&thread_shared, interval))?;
                Some(handle)
            }
            VsyncMode::Manual => None,
        };

        tracing::debug!(?display_size, ?mode, "Soft compositor created");
        Ok(Self { shared, vsync_thread })
    }

    /// Presents the outstanding update, if any, and fires its token on the
    /// calling thread. Returns whether an update was presented.
    pub fn fire_vsync(&self) -> bool {
        let token = self.shared.state.lock().present();
        match token {
            Some(token) => {
                token.fire();
                true
            }
            None => false,
        }
    }

    pub fn has_pending_update(&self) -> bool {
        self.shared.state.lock().in_flight.is_some()
    }

    /// Buffer currently on screen for `element`.
    pub fn visible_buffer(&self, element: ElementHandle) -> Option<BufferHandle> {
        self.shared.state.lock().elements.get(&element).map(|info| info.spec.buffer)
    }

    pub fn element_info(&self, element: ElementHandle) -> Option<ElementInfo> {
        self.shared.state.lock().elements.get(&element).copied()
    }

    /// All placed elements, bottom layer first.
    pub fn elements_by_layer(&self) -> Vec<(ElementHandle, ElementInfo)> {
        let state = self.shared.state.lock();
        let mut elements: Vec<_> = state.elements.iter().map(|(h, info)| (*h, *info)).collect();
        elements.sort_by_key(|(handle, info)| (info.spec.layer, *handle));
        elements
    }

    /// Copy of a buffer's pixels, rows packed at the buffer's stride.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        let state = self.shared.state.lock();
        state.buffers.get(buffer).ok().map(|details| details.pixels().to_vec())
    }

    /// Lets the next `count` buffer allocations succeed and fails every one after.
    pub fn fail_buffer_allocations_after(&self, count: usize) {
        self.shared.state.lock().allocations_left = Some(count);
    }

    pub fn clear_allocation_failures(&self) {
        self.shared.state.lock().allocations_left = None;
    }

    pub fn stats(&self) -> SoftStats {
        let state = self.shared.state.lock();
        SoftStats {
            open_displays: usize::from(state.open_display.is_some()),
            live_buffers: state.buffers.live(),
            buffers_created: state.buffers.created(),
            live_elements: state.elements.len(),
            updates_submitted: state.updates_submitted,
            updates_presented: state.updates_presented,
        }
    }
}

fn vsync_loop(shared: &Shared, interval: Duration) {
    tracing::debug!(?interval, "Soft vsync thread started");
    let mut next_tick = Instant::now() + interval;
    let mut state = shared.state.lock();
    loop {
        while !state.stopping && Instant::now() < next_tick {
            shared.stop_cond.wait_until(&mut state, next_tick);
        }
        if state.stopping {
            break;
        }
        next_tick += interval;
        if let Some(token) = state.present() {
            tracing::trace!(presented = state.updates_presented, "Vsync presented update");
            MutexGuard::unlocked(&mut state, || token.fire());
        }
    }
    tracing::debug!("Soft vsync thread stopped");
}

impl Compositor for SoftCompositor {
    fn open_display(&self, id: u32) -> Result<DisplayHandle> {
        let mut state = self.shared.state.lock();
        if state.open_display.is_some() {
            return Err(CompositorError::DisplayBusy(id));
        }
        let handle = DisplayHandle::new_unique();
        state.open_display = Some(handle);
        tracing::debug!(id, %handle, size = ?state.display_size, "Display opened");
        Ok(handle)
    }

    fn display_size(&self, display: DisplayHandle) -> Result<SizeInt> {
        let state = self.shared.state.lock();
        state.check_display(display)?;
        Ok(state.display_size)
    }

    fn close_display(&self, handle: DisplayHandle) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.check_display(handle)?;
        let remaining = state.elements.values().filter(|info| info.display == handle).count();
        if remaining > 0 {
            tracing::warn!(display = %handle, remaining, "Closing display with elements still placed");
        }
        state.open_display = None;
        tracing::debug!(display = %handle, "Display closed");
        Ok(())
    }

    fn create_buffer(&self, format: PixelFormat, width: u32, height: u32) -> Result<BufferHandle> {
        let mut state = self.shared.state.lock();
        if let Some(left) = state.allocations_left.as_mut() {
            if *left == 0 {
                return Err(CompositorError::AllocationFailed(format!(
                    "injected failure for {}x{} {} buffer",
                    width, height, format
                )));
            }
            *left -= 1;
        }
        let handle = state.buffers.register(format, width, height)?;
        tracing::trace!(%handle, %format, width, height, "Buffer created");
        Ok(handle)
    }

    fn delete_buffer(&self, buffer: BufferHandle) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.buffers.release(buffer)?;
        if state.elements.values().any(|info| info.spec.buffer == buffer) {
            tracing::warn!(%buffer, "Deleted a buffer that is still on screen");
        }
        tracing::trace!(%buffer, "Buffer deleted");
        Ok(())
    }

    fn write_pixels(
        &self,
        buffer: BufferHandle,
        format: PixelFormat,
        pitch: u32,
        data: &[u8],
        region: RectInt,
    ) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.buffers.get_mut(buffer)?.write_region(format, pitch, data, region)
    }

    fn add_element(&self, display: DisplayHandle, spec: &ElementSpec) -> Result<ElementHandle> {
        let mut state = self.shared.state.lock();
        state.check_display(display)?;
        if !state.buffers.contains(spec.buffer) {
            return Err(CompositorError::UnknownBuffer(spec.buffer));
        }
        let handle = ElementHandle::new_unique();
        state.elements.insert(handle, ElementInfo { display, spec: *spec });
        tracing::debug!(%handle, layer = spec.layer, dst = ?spec.dst, "Element added");
        Ok(handle)
    }

    fn remove_element(&self, element: ElementHandle) -> Result<()> {
        let mut state = self.shared.state.lock();
        state
            .elements
            .remove(&element)
            .ok_or(CompositorError::UnknownElement(element))?;
        state.staged.retain(|(staged, _)| *staged != element);
        tracing::debug!(%element, "Element removed");
        Ok(())
    }

    fn retarget(&self, element: ElementHandle, buffer: BufferHandle) -> Result<()> {
        let mut state = self.shared.state.lock();
        if !state.elements.contains_key(&element) {
            return Err(CompositorError::UnknownElement(element));
        }
        if !state.buffers.contains(buffer) {
            return Err(CompositorError::UnknownBuffer(buffer));
        }
        match state.staged.iter_mut().find(|(staged, _)| *staged == element) {
            Some(entry) => entry.1 = buffer,
            None => state.staged.push((element, buffer)),
        }
        Ok(())
    }

    fn submit_update(&self, token: CompletionToken) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.in_flight.is_some() {
            return Err(CompositorError::UpdatePending);
        }
        let retargets = mem::take(&mut state.staged);
        state.in_flight = Some(PendingUpdate { retargets, token });
        state.updates_submitted += 1;
        tracing::trace!(submitted = state.updates_submitted, "Update submitted");
        Ok(())
    }
}

impl Drop for SoftCompositor {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stopping = true;
            if state.in_flight.take().is_some() {
                tracing::debug!("Dropping an update that never reached vsync");
            }
        }
        self.shared.stop_cond.notify_all();
        if let Some(handle) = self.vsync_thread.take() {
            if handle.join().is_err() {
                tracing::error!("Soft vsync thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ElementAlpha;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn manual() -> SoftCompositor {
        SoftCompositor::new(SizeInt::new(640, 480), VsyncMode::Manual).unwrap()
    }

    fn spec(buffer: BufferHandle, layer: i32) -> ElementSpec {
        ElementSpec {
            layer,
            dst: RectInt::from_coords(0, 0, 640, 480),
            buffer,
            src: RectInt::from_coords(0, 0, 4, 4).to_fixed_16_16(),
            alpha: ElementAlpha::default(),
        }
    }

    fn counting_token(counter: &Arc<AtomicUsize>) -> CompletionToken {
        let counter = Arc::clone(counter);
        CompletionToken::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_single_open_display_per_connection() {
        let compositor = manual();
        let display = compositor.open_display(0).unwrap();
        assert_eq!(compositor.display_size(display).unwrap(), SizeInt::new(640, 480));
        assert!(matches!(compositor.open_display(0), Err(CompositorError::DisplayBusy(0))));

        compositor.close_display(display).unwrap();
        assert!(matches!(
            compositor.display_size(display),
            Err(CompositorError::UnknownDisplay(_))
        ));
        let reopened = compositor.open_display(0).unwrap();
        assert_ne!(reopened, display);
    }

    #[test]
    fn test_retarget_applies_at_vsync() {
        let compositor = manual();
        let display = compositor.open_display(0).unwrap();
        let first = compositor.create_buffer(PixelFormat::Rgb565, 4, 4).unwrap();
        let second = compositor.create_buffer(PixelFormat::Rgb565, 4, 4).unwrap();
        let element = compositor.add_element(display, &spec(first, 0)).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        compositor.retarget(element, second).unwrap();
        assert_eq!(compositor.visible_buffer(element), Some(first));

        compositor.submit_update(counting_token(&fired)).unwrap();
        assert_eq!(compositor.visible_buffer(element), Some(first));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(compositor.fire_vsync());
        assert_eq!(compositor.visible_buffer(element), Some(second));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!compositor.fire_vsync());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_outstanding_update_is_rejected() {
        let compositor = manual();
        let fired = Arc::new(AtomicUsize::new(0));
        compositor.submit_update(counting_token(&fired)).unwrap();
        assert!(matches!(
            compositor.submit_update(counting_token(&fired)),
            Err(CompositorError::UpdatePending)
        ));
        assert!(compositor.fire_vsync());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        compositor.submit_update(counting_token(&fired)).unwrap();
        assert!(compositor.has_pending_update());
    }

    #[test]
    fn test_write_pixels_and_contents() {
        let compositor = manual();
        let buffer = compositor.create_buffer(PixelFormat::Rgb565, 2, 2).unwrap();
        let data: Vec<u8> = [0x0FF0u16; 4].iter().flat_map(|p| p.to_ne_bytes()).collect();
        compositor
            .write_pixels(buffer, PixelFormat::Rgb565, 4, &data, RectInt::from_coords(0, 0, 2, 2))
            .unwrap();
        assert_eq!(compositor.buffer_contents(buffer).unwrap(), data);
    }

    #[test]
    fn test_unknown_handles() {
        let compositor = manual();
        let display = compositor.open_display(0).unwrap();
        let stray_buffer = BufferHandle::new_unique();
        let stray_element = ElementHandle::new_unique();
        assert!(matches!(
            compositor.add_element(display, &spec(stray_buffer, 0)),
            Err(CompositorError::UnknownBuffer(_))
        ));
        assert!(matches!(
            compositor.remove_element(stray_element),
            Err(CompositorError::UnknownElement(_))
        ));
        assert!(matches!(
            compositor.delete_buffer(stray_buffer),
            Err(CompositorError::UnknownBuffer(_))
        ));
        assert!(matches!(
            compositor.add_element(DisplayHandle::new_unique(), &spec(stray_buffer, 0)),
            Err(CompositorError::UnknownDisplay(_))
        ));
    }

    #[test]
    fn test_injected_allocation_failure() {
        let compositor = manual();
        compositor.fail_buffer_allocations_after(1);
        compositor.create_buffer(PixelFormat::Indexed8, 2, 2).unwrap();
        assert!(matches!(
            compositor.create_buffer(PixelFormat::Indexed8, 2, 2),
            Err(CompositorError::AllocationFailed(_))
        ));
        compositor.clear_allocation_failures();
        compositor.create_buffer(PixelFormat::Indexed8, 2, 2).unwrap();
        assert_eq!(compositor.stats().live_buffers, 2);
    }

    #[test]
    fn test_elements_by_layer_and_stats() {
        let compositor = manual();
        let display = compositor.open_display(0).unwrap();
        let buffer = compositor.create_buffer(PixelFormat::Rgb565, 4, 4).unwrap();
        let top = compositor.add_element(display, &spec(buffer, 0)).unwrap();
        let bottom = compositor.add_element(display, &spec(buffer, -1)).unwrap();

        let order: Vec<_> = compositor.elements_by_layer().into_iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![bottom, top]);
        assert_eq!(compositor.element_info(top).unwrap().display, display);

        compositor.remove_element(top).unwrap();
        compositor.remove_element(bottom).unwrap();
        compositor.delete_buffer(buffer).unwrap();
        compositor.close_display(display).unwrap();
        assert_eq!(
            compositor.stats(),
            SoftStats {
                open_displays: 0,
                live_buffers: 0,
                buffers_created: 1,
                live_elements: 0,
                updates_submitted: 0,
                updates_presented: 0,
            }
        );
    }

    #[test]
    fn test_interval_vsync_fires_on_its_own_thread() {
        let compositor = SoftCompositor::new(SizeInt::new(64, 64), VsyncMode::Interval(Duration::from_millis(2))).unwrap();
        let (tx, rx) = mpsc::channel();
        compositor
            .submit_update(CompletionToken::new(move || {
                let name = thread::current().name().map(str::to_string);
                let _ = tx.send(name);
            }))
            .unwrap();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("soft-vsync"));
        assert_eq!(compositor.stats().updates_presented, 1);
    }

    #[test]
    fn test_drop_stops_vsync_thread_and_discards_update() {
        let fired = Arc::new(AtomicUsize::new(0));
        let compositor = SoftCompositor::new(SizeInt::new(64, 64), VsyncMode::Interval(Duration::from_secs(3600))).unwrap();
        compositor.submit_update(counting_token(&fired)).unwrap();
        drop(compositor);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
