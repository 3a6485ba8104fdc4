//! Coordinate types shared by the renderer and its callers.
//!
//! World space convention:
//! - +X right, +Y down
//! - quad positions are centres, not corners
//!
//! Projection into clip space is entirely the caller's view-projection matrix.

mod mat4;
mod vec2;

pub use mat4::{Mat4, MAT4_IDENTITY};
pub use vec2::Vec2;
