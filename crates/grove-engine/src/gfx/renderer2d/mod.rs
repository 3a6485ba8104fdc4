//! Batched 2D quad renderer.
//!
//! Convention:
//! - World space is whatever the scene's view-projection maps; the sandbox
//!   uses logical pixels with a top-left origin and +Y down.
//! - Colors are straight-alpha linear RGBA, multiplied with the sampled texel.

mod renderer;
mod slots;
mod stats;
mod subtexture;
mod vertex;

pub use renderer::{Renderer2D, Renderer2DConfig, DEFAULT_MAX_QUADS};
pub use stats::Statistics;
pub use subtexture::SubTexture;
pub use vertex::{
    quad_corners, QuadVertex, UvRect, INDICES_PER_QUAD, QUAD_INDEX_PATTERN, QUAD_VERTEX_LAYOUT,
    VERTICES_PER_QUAD,
};
