//! Color model shared between the renderer and its callers.

pub mod color;

pub use color::Color;
