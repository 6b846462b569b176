//! Flip counters shared between producers and the completion path.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FlipStats {
    frames_submitted: AtomicU64,
    flips_completed: AtomicU64,
    page_waits: AtomicU64,
}

/// Point-in-time copy of [`FlipStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipStatsSnapshot {
    pub frames_submitted: u64,
    pub flips_completed: u64,
    /// Times a producer found no free page and had to wait.
    pub page_waits: u64,
}

impl FlipStats {
    pub fn record_submit(&self) {
        self.frames_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completion(&self) {
        self.flips_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_wait(&self) {
        self.page_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FlipStatsSnapshot {
        FlipStatsSnapshot {
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            flips_completed: self.flips_completed.load(Ordering::Relaxed),
            page_waits: self.page_waits.load(Ordering::Relaxed),
        }
    }
}
