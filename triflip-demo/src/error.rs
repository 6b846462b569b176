use thiserror::Error;
use triflip::FlipError;
use triflip_compositor::CompositorError;
use triflip_core::CoreError;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Page flip error: {0}")]
    Flip(#[from] FlipError),

    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),
}
