//! Moving-bar demo for the triflip page-flip scheduler.
//!
//! [`run`] opens a [`SoftCompositor`] with a timed vsync, sweeps a bar
//! across the content surface for the configured number of passes and shuts
//! the display down again.

pub mod error;
pub mod pattern;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use triflip::{DisplayContext, FlipError, FlipStatsSnapshot};
use triflip_compositor::{SoftCompositor, VsyncMode};
use triflip_core::{CoreConfig, SizeInt};

pub use error::DemoError;
pub use pattern::MovingBar;

pub fn run(config: &CoreConfig) -> Result<FlipStatsSnapshot, DemoError> {
    let demo = &config.demo;
    let bar = MovingBar::new(&config.display, demo.bar_width, demo.bar_color)
        .ok_or(FlipError::UnsupportedDepth(config.display.bits_per_pixel))?;

    let compositor = SoftCompositor::new(
        SizeInt::new(demo.display_width, demo.display_height),
        VsyncMode::Interval(Duration::from_millis(demo.vsync_interval_ms)),
    )?;
    let context = DisplayContext::init(Arc::new(compositor), &config.display)?;
    info!(
        src_width = config.display.src_width,
        src_height = config.display.src_height,
        passes = demo.passes,
        "Starting moving-bar demo"
    );

    for pass in 0..demo.passes {
        for left in bar.positions() {
            if let Err(e) = context.present_frame(&bar.render(left)) {
                // Still release the display before reporting.
                if let Err(shutdown_err) = context.shutdown() {
                    tracing::warn!("Shutdown after failed frame also failed: {}", shutdown_err);
                }
                return Err(e.into());
            }
        }
        tracing::debug!(pass, "Pass finished");
    }

    Ok(context.shutdown()?)
}
