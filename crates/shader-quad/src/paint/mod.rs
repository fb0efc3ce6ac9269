//! Paint primitives.
//!
//! Colors are linear premultiplied RGBA throughout the crate.

mod color;

pub use color::Color;
