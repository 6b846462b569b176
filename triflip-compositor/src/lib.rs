//! # Triflip Compositor
//!
//! The seam between the page-flip scheduler and a display compositor.
//! [`Compositor`] describes the handful of requests the scheduler needs:
//! opening a display, allocating and filling pixel buffers, placing layered
//! elements and submitting retargets that complete on vertical sync.
//!
//! [`SoftCompositor`] is an in-memory implementation with either a timed or
//! a manually driven vsync, used for tests, demos and headless runs.

pub mod adapter;
pub mod buffer;
pub mod error;
pub mod handle;
pub mod soft;

pub use adapter::{CompletionToken, Compositor, ElementAlpha, ElementSpec};
pub use buffer::{BufferDetails, BufferStore};
pub use error::{CompositorError, Result};
pub use handle::{BufferHandle, DisplayHandle, ElementHandle};
pub use soft::{ElementInfo, SoftCompositor, SoftStats, VsyncMode};
