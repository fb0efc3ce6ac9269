//! Coordinate and geometry types.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The quad program converts to NDC using the viewport uniform.

mod actor_box;
mod viewport;

pub use actor_box::ActorBox;
pub use viewport::Viewport;
