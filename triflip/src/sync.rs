//! The page-flip synchronization protocol.
//!
//! [`PageFlipSynchronizer`] coordinates producers submitting frames with the
//! compositor's completion callbacks:
//!
//! - a global pending-flip counter, guarded by the pending mutex and
//!   signalled through the pending condition, enforces at most one flip in
//!   flight per context;
//! - a free-page condition with its own mutex wakes producers waiting for a
//!   page of any surface to be recycled.
//!
//! Locks are always taken in the order pending, free, current page, page.

use parking_lot::{Condvar, Mutex};

use crate::page::PagePool;
use crate::stats::FlipStats;

/// Proof that no flip was pending when it was created.
///
/// Only [`PageFlipSynchronizer::wait_until_drained`] hands these out, and
/// surface teardown requires one.
#[derive(Debug)]
pub struct Drained {
    _private: (),
}

#[derive(Debug, Default)]
pub struct PageFlipSynchronizer {
    pending: Mutex<u32>,
    pending_cond: Condvar,
    free_lock: Mutex<()>,
    free_cond: Condvar,
    stats: FlipStats,
}

/// The right to submit the next flip.
///
/// Holding a slot counts as one pending flip. [`FlipSlot::commit`] hands that
/// count over to the submitted update, whose completion releases it; dropping
/// an uncommitted slot releases it immediately.
#[must_use = "dropping a FlipSlot without committing gives the slot back"]
#[derive(Debug)]
pub struct FlipSlot<'a> {
    sync: &'a PageFlipSynchronizer,
    committed: bool,
}

impl FlipSlot<'_> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for FlipSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.sync.release_slot();
        }
    }
}

impl PageFlipSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flips submitted or reserved but not yet completed.
    pub fn pending(&self) -> u32 {
        *self.pending.lock()
    }

    pub fn stats(&self) -> &FlipStats {
        &self.stats
    }

    /// Blocks while a flip is outstanding, then reserves the slot for the caller.
    ///
    /// The counter is raised before this returns, so a completion can never
    /// observe it at zero for a flip that is being submitted, and concurrent
    /// producers queue up behind each other.
    pub fn wait_for_flip_slot(&self) -> FlipSlot<'_> {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            tracing::trace!(pending = *pending, "Waiting for flip slot");
            self.pending_cond.wait(&mut pending);
        }
        *pending += 1;
        FlipSlot {
            sync: self,
            committed: false,
        }
    }

    /// Claims a free page of `pool`, blocking until one is recycled.
    ///
    /// The free-page mutex is held across the scan and released only inside
    /// the wait, so a page freed mid-scan still wakes this producer.
    pub fn acquire_free_page(&self, pool: &PagePool) -> usize {
        let mut free = self.free_lock.lock();
        let mut waited = false;
        loop {
            if let Some(index) = pool.claim_free() {
                tracing::trace!(surface = ?pool.surface(), index, "Page acquired");
                return index;
            }
            if !waited {
                waited = true;
                self.stats.record_page_wait();
                tracing::warn!(surface = ?pool.surface(), pages = pool.len(), "No free page, waiting for a flip to complete");
            }
            self.free_cond.wait(&mut free);
        }
    }

    /// Completion of the flip that put page `index` of `pool` on screen.
    ///
    /// Runs on the compositor's notification thread. The replaced page is
    /// freed and `index` promoted before the pending counter drops, so a woken
    /// producer always sees the new state.
    pub fn on_flip_complete(&self, pool: &PagePool, index: usize) {
        let previous = pool.promote(index);
        tracing::trace!(surface = ?pool.surface(), index, ?previous, "Flip completed");

        let mut pending = self.pending.lock();
        if *pending == 0 {
            tracing::error!(surface = ?pool.surface(), index, "Flip completion without a pending flip");
        } else {
            *pending -= 1;
        }
        self.stats.record_completion();
        self.pending_cond.notify_all();
        let _free = self.free_lock.lock();
        self.free_cond.notify_all();
    }

    /// Wakes producers waiting for a page after one was handed back without
    /// being flipped.
    pub(crate) fn notify_page_freed(&self) {
        let _free = self.free_lock.lock();
        self.free_cond.notify_all();
    }

    /// Blocks until no flip is pending.
    pub fn wait_until_drained(&self) -> Drained {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            tracing::debug!(pending = *pending, "Waiting for pending flips to drain");
            self.pending_cond.wait(&mut pending);
        }
        Drained { _private: () }
    }

    fn release_slot(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        self.pending_cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SurfaceId;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use triflip_compositor::BufferHandle;

    const BLOCKED: Duration = Duration::from_millis(100);
    const WAKE: Duration = Duration::from_secs(5);

    fn pool(pages: usize) -> Arc<PagePool> {
        let buffers: Vec<_> = (0..pages).map(|_| BufferHandle::new_unique()).collect();
        Arc::new(PagePool::new(SurfaceId::new_unique(), &buffers))
    }

    fn flip(sync: &PageFlipSynchronizer, pool: &PagePool) -> usize {
        let slot = sync.wait_for_flip_slot();
        let index = sync.acquire_free_page(pool);
        slot.commit();
        index
    }

    #[test]
    fn test_slot_counts_as_pending_until_completion() {
        let sync = PageFlipSynchronizer::new();
        let pool = pool(3);
        assert_eq!(sync.pending(), 0);
        let index = flip(&sync, &pool);
        assert_eq!(sync.pending(), 1);
        sync.on_flip_complete(&pool, index);
        assert_eq!(sync.pending(), 0);
        assert_eq!(sync.stats().snapshot().flips_completed, 1);
    }

    #[test]
    fn test_uncommitted_slot_is_released_on_drop() {
        let sync = PageFlipSynchronizer::new();
        {
            let _slot = sync.wait_for_flip_slot();
            assert_eq!(sync.pending(), 1);
        }
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn test_second_slot_waits_for_completion() {
        let sync = Arc::new(PageFlipSynchronizer::new());
        let pool = pool(3);
        let first = flip(&sync, &pool);

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                let slot = sync.wait_for_flip_slot();
                tx.send(sync.pending()).unwrap();
                drop(slot);
            })
        };
        assert!(rx.recv_timeout(BLOCKED).is_err(), "slot must not be granted while a flip is pending");

        sync.on_flip_complete(&pool, first);
        assert_eq!(rx.recv_timeout(WAKE).unwrap(), 1);
        waiter.join().unwrap();
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn test_replaced_page_is_free_before_slot_wakes() {
        let sync = Arc::new(PageFlipSynchronizer::new());
        let pool = pool(3);
        let first = flip(&sync, &pool);
        sync.on_flip_complete(&pool, first);
        let second = flip(&sync, &pool);

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let sync = Arc::clone(&sync);
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let _slot = sync.wait_for_flip_slot();
                tx.send((pool.page(first).unwrap().is_used(), pool.current())).unwrap();
            })
        };
        assert!(rx.recv_timeout(BLOCKED).is_err());

        sync.on_flip_complete(&pool, second);
        assert_eq!(rx.recv_timeout(WAKE).unwrap(), (false, Some(second)));
        waiter.join().unwrap();
    }

    #[test]
    fn test_acquire_blocks_until_replaced_page_is_freed() {
        let sync = Arc::new(PageFlipSynchronizer::new());
        let pool = pool(3);
        for expected in 0..3 {
            assert_eq!(sync.acquire_free_page(&pool), expected);
        }

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let sync = Arc::clone(&sync);
            let pool = Arc::clone(&pool);
            thread::spawn(move || tx.send(sync.acquire_free_page(&pool)).unwrap())
        };
        assert!(rx.recv_timeout(BLOCKED).is_err());

        // Page 0 becoming visible frees nothing.
        sync.wait_for_flip_slot().commit();
        sync.on_flip_complete(&pool, 0);
        assert!(rx.recv_timeout(BLOCKED).is_err());
        assert!(pool.page(0).unwrap().is_used());

        // Page 1 replacing it frees page 0.
        sync.wait_for_flip_slot().commit();
        sync.on_flip_complete(&pool, 1);
        assert_eq!(rx.recv_timeout(WAKE).unwrap(), 0);
        waiter.join().unwrap();
        assert_eq!(sync.stats().snapshot().page_waits, 1);
    }

    #[test]
    fn test_wait_until_drained_blocks_on_pending_flip() {
        let sync = Arc::new(PageFlipSynchronizer::new());
        let pool = pool(2);
        let index = flip(&sync, &pool);

        let (tx, rx) = mpsc::channel();
        let drainer = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                let _drained = sync.wait_until_drained();
                tx.send(()).unwrap();
            })
        };
        assert!(rx.recv_timeout(BLOCKED).is_err());
        sync.on_flip_complete(&pool, index);
        rx.recv_timeout(WAKE).unwrap();
        drainer.join().unwrap();
    }

    #[test]
    fn test_spurious_completion_does_not_underflow() {
        let sync = PageFlipSynchronizer::new();
        let pool = pool(2);
        sync.on_flip_complete(&pool, 0);
        assert_eq!(sync.pending(), 0);
    }
}
