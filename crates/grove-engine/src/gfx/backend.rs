//! GPU backend contract consumed by the 2D renderer.
//!
//! The renderer only ever talks to a [`GpuBackend`]. Handles are opaque ids
//! minted by the backend; the renderer compares them but never looks inside.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::coords::Mat4;

/// Maximum number of textures bound to a single draw.
///
/// 16 is the lowest simultaneous-sampler count guaranteed across backends.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Uniform name under which the scene's view-projection matrix is submitted.
pub const VIEW_PROJECTION_UNIFORM: &str = "uVP";

/// Sampler names, indexed by slot.
pub const SAMPLER_NAMES: [&str; MAX_TEXTURE_SLOTS] = [
    "uTex[0]", "uTex[1]", "uTex[2]", "uTex[3]", "uTex[4]", "uTex[5]", "uTex[6]", "uTex[7]",
    "uTex[8]", "uTex[9]", "uTex[10]", "uTex[11]", "uTex[12]", "uTex[13]", "uTex[14]", "uTex[15]",
];

// ── handles ───────────────────────────────────────────────────────────────

/// GPU-resident image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Vertex + index buffer pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshHandle(pub u32);

/// Compiled shader program plus fixed-function state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineHandle(pub u32);

// ── vertex layout ─────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttribType {
    Float32,
}

/// One vertex attribute. `components` is 1..=4.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttrib {
    pub location: u32,
    pub components: u32,
    pub ty: AttribType,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// Interleaved vertex layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    /// Bytes per vertex.
    pub stride: u32,
    pub attributes: &'static [VertexAttrib],
}

// ── resource descriptors ──────────────────────────────────────────────────

/// Mesh creation parameters. The initial data also fixes the mesh capacity.
#[derive(Debug, Clone, Copy)]
pub struct MeshDesc<'a> {
    pub vertices: &'a [u8],
    pub indices: &'a [u32],
    pub layout: VertexLayout,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc<'a> {
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub vertex_layout: VertexLayout,
    pub depth_test: bool,
    pub blend: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
}

/// Texture creation parameters. `pixels` is tightly packed, row 0 first.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: &'a [u8],
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
}

impl<'a> TextureDesc<'a> {
    /// RGBA8 texture with nearest filtering and clamped edges.
    pub fn rgba8(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            pixels,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
        }
    }

    pub fn with_filters(mut self, min: FilterMode, mag: FilterMode) -> Self {
        self.min_filter = min;
        self.mag_filter = mag;
        self
    }

    pub fn with_wrap(mut self, u: WrapMode, v: WrapMode) -> Self {
        self.wrap_u = u;
        self.wrap_v = v;
        self
    }

    /// Byte length `pixels` must have.
    pub fn expected_len(&self) -> usize {
        match self.format {
            TextureFormat::Rgba8 => self.width as usize * self.height as usize * 4,
        }
    }
}

// ── draw submission ───────────────────────────────────────────────────────

/// Value of a named shader uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Mat4(Mat4),
}

/// Uniforms of one draw: the view-projection matrix plus scene extras.
///
/// Extras win over the view-projection entry when they share its name.
#[derive(Debug, Clone, Copy)]
pub struct Uniforms<'a> {
    view_projection: &'a Mat4,
    extra: &'a BTreeMap<String, UniformValue>,
}

impl<'a> Uniforms<'a> {
    pub fn new(view_projection: &'a Mat4, extra: &'a BTreeMap<String, UniformValue>) -> Self {
        Self {
            view_projection,
            extra,
        }
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        if let Some(v) = self.extra.get(name) {
            return Some(*v);
        }
        (name == VIEW_PROJECTION_UNIFORM).then_some(UniformValue::Mat4(*self.view_projection))
    }

    /// The effective view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        match self.extra.get(VIEW_PROJECTION_UNIFORM) {
            Some(UniformValue::Mat4(m)) => *m,
            _ => *self.view_projection,
        }
    }

    /// All uniforms; the view-projection entry first, then extras by name.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, UniformValue)> + 'a {
        let vp = (!self.extra.contains_key(VIEW_PROJECTION_UNIFORM))
            .then_some((VIEW_PROJECTION_UNIFORM, UniformValue::Mat4(*self.view_projection)));
        vp.into_iter()
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn len(&self) -> usize {
        self.extra.len() + usize::from(!self.extra.contains_key(VIEW_PROJECTION_UNIFORM))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Texture bindings of one draw, keyed by [`SAMPLER_NAMES`].
#[derive(Debug, Clone, Copy)]
pub struct Samplers<'a> {
    textures: &'a [TextureHandle],
}

impl<'a> Samplers<'a> {
    pub fn new(textures: &'a [TextureHandle]) -> Self {
        debug_assert!(textures.len() <= MAX_TEXTURE_SLOTS);
        Self { textures }
    }

    /// Bound textures in slot order.
    pub fn textures(&self) -> &'a [TextureHandle] {
        self.textures
    }

    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        let slot = SAMPLER_NAMES.iter().position(|n| *n == name)?;
        self.textures.get(slot).copied()
    }

    pub fn iter(self) -> impl Iterator<Item = (&'static str, TextureHandle)> + 'a {
        SAMPLER_NAMES.iter().copied().zip(self.textures.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// One draw submission.
///
/// Draws the index range uploaded by the most recent `update_mesh` on `mesh`.
#[derive(Debug, Clone, Copy)]
pub struct DrawCmd<'a> {
    pub pipeline: PipelineHandle,
    pub mesh: MeshHandle,
    pub uniforms: Uniforms<'a>,
    pub samplers: Samplers<'a>,
}

// ── contract ──────────────────────────────────────────────────────────────

/// Capability set the renderer needs from a graphics API.
///
/// Implementations own every resource behind the handles they return.
pub trait GpuBackend {
    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshHandle>;

    /// Re-uploads mesh contents in place. Must not reallocate the handle.
    ///
    /// Data larger than the capacity given at creation is an error.
    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[u8], indices: &[u32]) -> Result<()>;

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle>;

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle>;

    /// Executes exactly one draw submission.
    fn draw(&mut self, cmd: &DrawCmd<'_>);
}
