//! # Triflip
//!
//! A triple-buffered page-flip scheduler for compositors that accept at most
//! one outstanding flip and report completion asynchronously.
//!
//! - [`PageFlipSynchronizer`]: the mutex/condition-variable protocol between
//!   producers and completion callbacks.
//! - [`Page`] and [`PagePool`]: backing buffers and their in-use flags.
//! - [`Surface`]: a page pool bound to one on-screen element, with
//!   [`Surface::submit_frame`].
//! - [`DisplayContext`]: an open display with a blanking surface and a
//!   content surface.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use triflip::DisplayContext;
//! use triflip_compositor::{SoftCompositor, VsyncMode};
//! use triflip_core::{DisplayConfig, SizeInt};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let compositor = SoftCompositor::new(SizeInt::new(1920, 1080), VsyncMode::Interval(Duration::from_millis(16)))?;
//! let context = DisplayContext::init(Arc::new(compositor), &DisplayConfig::default())?;
//! let frame = vec![0u8; context.surface(triflip::SurfaceKind::Content).geometry().frame_len()];
//! context.present_frame(&frame)?;
//! let stats = context.shutdown()?;
//! println!("{} frames", stats.frames_submitted);
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod error;
pub mod page;
pub mod stats;
pub mod surface;
pub mod sync;

pub use display::{DisplayContext, SurfaceKind};
pub use error::{FlipError, Result};
pub use page::{Page, PagePool, PageRef, SurfaceId};
pub use stats::{FlipStats, FlipStatsSnapshot};
pub use surface::{Surface, SurfaceDescriptor, SurfaceGeometry};
pub use sync::{Drained, FlipSlot, PageFlipSynchronizer};
