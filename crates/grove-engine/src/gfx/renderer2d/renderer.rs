use std::collections::BTreeMap;

use anyhow::{Context, Result};
use bytemuck::Zeroable;

use crate::coords::{Mat4, Vec2, MAT4_IDENTITY};
use crate::gfx::backend::{
    DrawCmd, GpuBackend, MeshDesc, MeshHandle, PipelineDesc, PipelineHandle, Samplers,
    TextureDesc, TextureHandle, UniformValue, Uniforms,
};
use crate::paint::Color;

use super::slots::TextureSlots;
use super::stats::Statistics;
use super::subtexture::SubTexture;
use super::vertex::{
    push_quad, quad_corners, QuadVertex, UvRect, INDICES_PER_QUAD, QUAD_VERTEX_LAYOUT,
    VERTICES_PER_QUAD,
};

/// Batch size used when the caller passes `0`.
pub const DEFAULT_MAX_QUADS: usize = 10_000;

/// Renderer construction parameters.
#[derive(Debug, Clone)]
pub struct Renderer2DConfig {
    /// Quads per draw submission. `0` selects [`DEFAULT_MAX_QUADS`].
    pub max_quads_per_batch: usize,
}

impl Default for Renderer2DConfig {
    fn default() -> Self {
        Self {
            max_quads_per_batch: DEFAULT_MAX_QUADS,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SceneState {
    /// Between `end_scene` and the next `begin_scene`.
    Idle,
    /// Accepting draw calls.
    Recording,
    /// Submitting the current batch; only entered from `Recording`.
    Flushing,
}

/// Batched quad renderer.
///
/// Draw calls between [`begin_scene`](Self::begin_scene) and
/// [`end_scene`](Self::end_scene) are appended to one vertex/index batch. The
/// batch is submitted as a single draw when it reaches `max_quads`, when a
/// 17th distinct texture is needed, or when the scene ends. Submission order
/// equals call order, so overlapping quads blend back to front.
///
/// Vertex and index storage is allocated once at construction; steady-state
/// scenes do not allocate.
pub struct Renderer2D<B: GpuBackend> {
    backend: B,
    pipeline: PipelineHandle,
    mesh: MeshHandle,
    white: TextureHandle,

    slots: TextureSlots,
    vertices: Vec<QuadVertex>,
    indices: Vec<u32>,
    quad_count: usize,
    max_quads: usize,

    view_projection: Mat4,
    extra_uniforms: BTreeMap<String, UniformValue>,

    stats: Statistics,
    state: SceneState,
    warned_draw_outside_scene: bool,
}

impl<B: GpuBackend> Renderer2D<B> {
    /// Compiles the quad pipeline and allocates the batch buffers.
    ///
    /// `max_quads == 0` selects [`DEFAULT_MAX_QUADS`].
    pub fn new(
        backend: B,
        vertex_source: &str,
        fragment_source: &str,
        max_quads: usize,
    ) -> Result<Self> {
        let config = Renderer2DConfig {
            max_quads_per_batch: max_quads,
        };
        Self::with_config(backend, vertex_source, fragment_source, &config)
    }

    pub fn with_config(
        mut backend: B,
        vertex_source: &str,
        fragment_source: &str,
        config: &Renderer2DConfig,
    ) -> Result<Self> {
        let max_quads = match config.max_quads_per_batch {
            0 => DEFAULT_MAX_QUADS,
            n => n,
        };

        let pipeline = backend
            .create_pipeline(&PipelineDesc {
                vertex_source,
                fragment_source,
                vertex_layout: QUAD_VERTEX_LAYOUT,
                depth_test: false,
                blend: true,
            })
            .context("failed to create quad pipeline")?;

        let white = backend
            .create_texture(&TextureDesc::rgba8(1, 1, &[255, 255, 255, 255]))
            .context("failed to create white texture")?;

        let vertices = vec![QuadVertex::zeroed(); max_quads * VERTICES_PER_QUAD];
        let indices = vec![0u32; max_quads * INDICES_PER_QUAD];
        let mesh = backend
            .create_mesh(&MeshDesc {
                vertices: bytemuck::cast_slice(&vertices),
                indices: &indices,
                layout: QUAD_VERTEX_LAYOUT,
            })
            .context("failed to allocate batch mesh")?;

        log::debug!("renderer2d ready: {max_quads} quads per batch");

        // Reuse the staging allocations as the batch arenas.
        let mut vertices = vertices;
        let mut indices = indices;
        vertices.clear();
        indices.clear();

        Ok(Self {
            backend,
            pipeline,
            mesh,
            white,
            slots: TextureSlots::new(white),
            vertices,
            indices,
            quad_count: 0,
            max_quads,
            view_projection: MAT4_IDENTITY,
            extra_uniforms: BTreeMap::new(),
            stats: Statistics::default(),
            state: SceneState::Idle,
            warned_draw_outside_scene: false,
        })
    }

    // ── scene ─────────────────────────────────────────────────────────────

    /// Opens a scene. Statistics restart from zero.
    ///
    /// Scenes do not nest. Opening one while another is open is a caller
    /// error: it is logged and the open scene is ended first, so its geometry
    /// is submitted under its own view-projection.
    pub fn begin_scene(&mut self, view_projection: Mat4) {
        if self.state != SceneState::Idle {
            log::warn!("renderer2d: begin_scene while a scene is open; ending the previous scene");
            self.end_scene();
        }
        self.view_projection = view_projection;
        self.stats = Statistics::default();
        self.reset_batch();
        self.state = SceneState::Recording;
    }

    /// Submits any pending geometry and closes the scene. No-op when no scene is open.
    pub fn end_scene(&mut self) {
        if self.state == SceneState::Idle {
            return;
        }
        self.flush();
        self.state = SceneState::Idle;
    }

    /// Statistics of the current (or last) scene.
    #[inline]
    pub fn stats(&self) -> Statistics {
        self.stats
    }

    /// Sets an extra uniform sent with every draw; `None` removes it.
    ///
    /// Values persist across flushes and scenes until overwritten or removed.
    /// Overwriting an existing name does not allocate.
    pub fn set_uniform(&mut self, name: &str, value: Option<UniformValue>) {
        match value {
            Some(v) => match self.extra_uniforms.get_mut(name) {
                Some(slot) => *slot = v,
                None => {
                    self.extra_uniforms.insert(name.to_owned(), v);
                }
            },
            None => {
                self.extra_uniforms.remove(name);
            }
        }
    }

    // ── draw calls ────────────────────────────────────────────────────────

    /// Solid-color quad centred on `(x, y)`, rotated by `rotation` radians.
    pub fn draw_quad(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, rotation: f32) {
        let white = self.white;
        self.enqueue_quad(Vec2::new(x, y), w, h, color, rotation, white, UvRect::FULL);
    }

    /// Quad showing the whole of `texture`, multiplied by `tint`.
    pub fn draw_textured_quad(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        texture: TextureHandle,
        tint: Color,
        rotation: f32,
    ) {
        self.enqueue_quad(Vec2::new(x, y), w, h, tint, rotation, texture, UvRect::FULL);
    }

    /// Quad showing the `uv` region of `texture`.
    pub fn draw_textured_quad_uv(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        texture: TextureHandle,
        tint: Color,
        rotation: f32,
        uv: UvRect,
    ) {
        self.enqueue_quad(Vec2::new(x, y), w, h, tint, rotation, texture, uv);
    }

    /// Quad showing an atlas region.
    pub fn draw_sub_texture_quad(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        sub: &SubTexture,
        tint: Color,
        rotation: f32,
    ) {
        self.enqueue_quad(Vec2::new(x, y), w, h, tint, rotation, sub.texture, sub.uv_rect());
    }

    // ── accessors ─────────────────────────────────────────────────────────

    /// The 1×1 white texture bound to slot 0.
    #[inline]
    pub fn white_texture(&self) -> TextureHandle {
        self.white
    }

    #[inline]
    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Backend access for resource creation. Must not be used to draw mid-scene.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn enqueue_quad(
        &mut self,
        center: Vec2,
        w: f32,
        h: f32,
        color: Color,
        rotation: f32,
        texture: TextureHandle,
        uv: UvRect,
    ) {
        if self.state != SceneState::Recording {
            if !self.warned_draw_outside_scene {
                log::warn!("renderer2d: draw call outside begin_scene/end_scene; quad dropped");
                self.warned_draw_outside_scene = true;
            }
            return;
        }

        self.ensure_quad_capacity();
        let slot = self.resolve_slot(texture);

        push_quad(
            &mut self.vertices,
            &mut self.indices,
            quad_corners(center, w, h, rotation),
            color.to_array(),
            uv,
            slot,
        );
        self.quad_count += 1;
        self.stats.quad_count += 1;
    }

    fn ensure_quad_capacity(&mut self) {
        if self.quad_count >= self.max_quads {
            self.flush();
        }
    }

    fn resolve_slot(&mut self, texture: TextureHandle) -> usize {
        if let Some(slot) = self.slots.find_or_insert(texture) {
            return slot;
        }
        // Table full: submit what uses the current bindings. A full table
        // means the batch is non-empty, so the flush also resets the slots.
        self.flush();
        debug_assert_eq!(self.slots.len(), 1);
        match self.slots.find_or_insert(texture) {
            Some(slot) => slot,
            None => unreachable!("a reset slot table has free slots"),
        }
    }

    fn flush(&mut self) {
        if self.quad_count == 0 {
            return;
        }
        debug_assert_eq!(self.state, SceneState::Recording);
        debug_assert_eq!(
            self.indices.len() * VERTICES_PER_QUAD,
            self.vertices.len() * INDICES_PER_QUAD
        );
        self.state = SceneState::Flushing;

        // The mesh was sized for `max_quads` at construction, so a failed
        // upload means CPU and GPU state have diverged.
        if let Err(err) = self.backend.update_mesh(
            self.mesh,
            bytemuck::cast_slice(&self.vertices),
            &self.indices,
        ) {
            panic!("renderer2d: batch upload into pre-sized mesh failed: {err:#}");
        }

        let cmd = DrawCmd {
            pipeline: self.pipeline,
            mesh: self.mesh,
            uniforms: Uniforms::new(&self.view_projection, &self.extra_uniforms),
            samplers: Samplers::new(self.slots.as_slice()),
        };
        self.backend.draw(&cmd);

        self.stats.draw_calls += 1;
        self.stats.texture_count = self.slots.len();
        log::trace!(
            "renderer2d flush: {} quads, {} textures",
            self.quad_count,
            self.slots.len()
        );

        self.reset_batch();
        self.state = SceneState::Recording;
    }

    fn reset_batch(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.quad_count = 0;
        self.slots.reset();
    }
}
