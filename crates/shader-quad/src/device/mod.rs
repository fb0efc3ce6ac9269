//! GPU device bootstrap.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - creating offscreen color targets quads can paint into
//!
//! Windowed hosts bring their own device and build a
//! [`RenderCtx`](crate::render::RenderCtx) directly.

mod headless;
mod init;
mod target;

pub use headless::HeadlessGpu;
pub use init::GpuInit;
pub use target::OffscreenTarget;
