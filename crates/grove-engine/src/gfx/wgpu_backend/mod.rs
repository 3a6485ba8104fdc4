//! wgpu implementation of the backend contract.

mod backend;

pub use backend::WgpuBackend;

/// WGSL vertex stage for [`QuadVertex`](crate::gfx::renderer2d::QuadVertex) batches.
pub const QUAD_VERTEX_WGSL: &str = include_str!("shaders/quad_vs.wgsl");

/// WGSL fragment stage sampling one of 16 texture slots per fragment.
pub const QUAD_FRAGMENT_WGSL: &str = include_str!("shaders/quad_fs.wgsl");
