//! Graphics: the backend contract, the batch renderer built on it, and the
//! wgpu implementation used at runtime.

pub mod backend;
pub mod renderer2d;
pub mod wgpu_backend;

#[cfg(test)]
mod testing;

pub use backend::{
    DrawCmd, FilterMode, GpuBackend, MeshDesc, MeshHandle, PipelineDesc, PipelineHandle, Samplers,
    TextureDesc, TextureFormat, TextureHandle, UniformValue, Uniforms, VertexAttrib, VertexLayout,
    WrapMode, MAX_TEXTURE_SLOTS, SAMPLER_NAMES, VIEW_PROJECTION_UNIFORM,
};
pub use renderer2d::{Renderer2D, Renderer2DConfig, Statistics, SubTexture, UvRect};
pub use wgpu_backend::{WgpuBackend, QUAD_FRAGMENT_WGSL, QUAD_VERTEX_WGSL};
