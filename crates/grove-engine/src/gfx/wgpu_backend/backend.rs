use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{bail, ensure, Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::gfx::backend::{
    AttribType, DrawCmd, FilterMode, GpuBackend, MeshDesc, MeshHandle, PipelineDesc,
    PipelineHandle, TextureDesc, TextureFormat, TextureHandle, UniformValue, VertexLayout,
    WrapMode, MAX_TEXTURE_SLOTS, VIEW_PROJECTION_UNIFORM,
};

/// `vec4` parameter slots available to extra uniforms.
const PARAM_SLOTS: usize = 4;

/// Bind group cache entries kept before the cache is dropped wholesale.
const MAX_CACHED_BIND_GROUPS: usize = 256;

/// Group 0 uniform block.
///
/// Extra uniforms are packed into `params` in name order, each widened to a
/// `vec4`. `Mat4` extras other than the view-projection do not fit and are
/// skipped.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [f32; 16],
    params: [[f32; 4]; PARAM_SLOTS],
}

struct GpuMesh {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    vertex_capacity: usize, // bytes
    index_capacity: usize,
    index_count: u32,
}

struct GpuPipeline {
    pipeline: wgpu::RenderPipeline,
}

struct GpuTexture {
    // Keeps the allocation alive behind `view`.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// [`GpuBackend`] over a wgpu device.
///
/// Every `draw` records its own render pass and submits it immediately, so
/// the mesh and uniform contents seen by a draw are the ones written just
/// before it. Draws load (never clear) the bound target.
///
/// Unused sampler slots repeat the slot 0 texture, so every binding of the
/// 16-slot layout is always populated.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    target: Option<wgpu::TextureView>,

    globals_ubo: wgpu::Buffer,
    globals_layout: wgpu::BindGroupLayout,
    globals_bind_group: wgpu::BindGroup,
    textures_layout: wgpu::BindGroupLayout,
    texture_bind_groups: HashMap<[u32; MAX_TEXTURE_SLOTS], wgpu::BindGroup>,

    meshes: Vec<GpuMesh>,
    pipelines: Vec<GpuPipeline>,
    textures: Vec<GpuTexture>,

    warned_no_target: bool,
    warned_params: bool,
    warned_depth_test: bool,
}

impl WgpuBackend {
    /// Creates a backend drawing into views of `target_format`.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grove quad globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<Globals>() as u64),
                },
                count: None,
            }],
        });

        let texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
            .flat_map(|slot| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: slot * 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: slot * 2 + 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect();

        let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grove quad textures bgl"),
            entries: &texture_entries,
        });

        let globals_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grove quad globals ubo"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grove quad globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        Self {
            device,
            queue,
            target_format,
            target: None,
            globals_ubo,
            globals_layout,
            globals_bind_group,
            textures_layout,
            texture_bind_groups: HashMap::new(),
            meshes: Vec::new(),
            pipelines: Vec::new(),
            textures: Vec::new(),
            warned_no_target: false,
            warned_params: false,
            warned_depth_test: false,
        }
    }

    /// Sets the color target for subsequent draws.
    ///
    /// The view must have the format given at construction.
    pub fn bind_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    /// Releases the current target; draws are skipped until the next bind.
    pub fn unbind_target(&mut self) {
        self.target = None;
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn globals_for(&mut self, cmd: &DrawCmd<'_>) -> Globals {
        let mut globals = Globals {
            view_proj: cmd.uniforms.view_projection(),
            params: [[0.0; 4]; PARAM_SLOTS],
        };

        let mut next = 0;
        let mut dropped = false;
        for (name, value) in cmd.uniforms.iter() {
            if name == VIEW_PROJECTION_UNIFORM {
                continue;
            }
            let Some(packed) = pack_param(value) else {
                dropped = true;
                continue;
            };
            if next == PARAM_SLOTS {
                dropped = true;
                break;
            }
            globals.params[next] = packed;
            next += 1;
        }

        if dropped && !self.warned_params {
            log::warn!(
                "WgpuBackend: extra uniforms beyond {PARAM_SLOTS} vec4 slots \
                 or of type mat4 are ignored"
            );
            self.warned_params = true;
        }
        globals
    }

    fn ensure_texture_bind_group(
        &mut self,
        textures: &[TextureHandle],
    ) -> Option<[u32; MAX_TEXTURE_SLOTS]> {
        if self.textures.is_empty() {
            return None;
        }
        let filler = textures.first().map_or(0, |t| t.0);

        let mut key = [filler; MAX_TEXTURE_SLOTS];
        for (slot, tex) in textures.iter().enumerate() {
            if tex.0 as usize >= self.textures.len() {
                log::error!("WgpuBackend: draw references unknown texture {tex:?}");
                return None;
            }
            key[slot] = tex.0;
        }

        if self.texture_bind_groups.contains_key(&key) {
            return Some(key);
        }
        if self.texture_bind_groups.len() >= MAX_CACHED_BIND_GROUPS {
            log::debug!("WgpuBackend: texture bind group cache full; clearing");
            self.texture_bind_groups.clear();
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = key
            .iter()
            .enumerate()
            .flat_map(|(slot, &id)| {
                let tex = &self.textures[id as usize];
                [
                    wgpu::BindGroupEntry {
                        binding: slot as u32 * 2,
                        resource: wgpu::BindingResource::TextureView(&tex.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: slot as u32 * 2 + 1,
                        resource: wgpu::BindingResource::Sampler(&tex.sampler),
                    },
                ]
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grove quad textures bind group"),
            layout: &self.textures_layout,
            entries: &entries,
        });
        self.texture_bind_groups.insert(key, bind_group);
        Some(key)
    }

    fn compile(&self, label: &str, source: &str) -> Result<wgpu::ShaderModule> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            bail!("{label} failed to compile:\n{}", errors.join("\n"));
        }
        for msg in &info.messages {
            log::debug!("{label}: {}", msg.message);
        }
        Ok(module)
    }
}

impl GpuBackend for WgpuBackend {
    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshHandle> {
        ensure!(!desc.vertices.is_empty() && !desc.indices.is_empty(), "mesh must not be empty");
        ensure!(
            desc.vertices.len() % desc.layout.stride as usize == 0,
            "vertex data is not a whole number of {}-byte vertices",
            desc.layout.stride
        );

        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grove quad vbo"),
            contents: desc.vertices,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grove quad ibo"),
            contents: bytemuck::cast_slice(desc.indices),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });

        self.meshes.push(GpuMesh {
            vbo,
            ibo,
            vertex_capacity: desc.vertices.len(),
            index_capacity: desc.indices.len(),
            index_count: desc.indices.len() as u32,
        });
        log::debug!(
            "WgpuBackend: mesh {} ({} vertex bytes, {} indices)",
            self.meshes.len() - 1,
            desc.vertices.len(),
            desc.indices.len()
        );
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[u8], indices: &[u32]) -> Result<()> {
        let gpu_mesh = self
            .meshes
            .get_mut(mesh.0 as usize)
            .with_context(|| format!("unknown mesh {mesh:?}"))?;

        ensure!(
            vertices.len() <= gpu_mesh.vertex_capacity && indices.len() <= gpu_mesh.index_capacity,
            "mesh upload of {} vertex bytes / {} indices exceeds capacity {} / {}",
            vertices.len(),
            indices.len(),
            gpu_mesh.vertex_capacity,
            gpu_mesh.index_capacity
        );
        ensure!(
            vertices.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0,
            "vertex upload is not {}-byte aligned",
            wgpu::COPY_BUFFER_ALIGNMENT
        );

        if !vertices.is_empty() {
            self.queue.write_buffer(&gpu_mesh.vbo, 0, vertices);
        }
        if !indices.is_empty() {
            self.queue.write_buffer(&gpu_mesh.ibo, 0, bytemuck::cast_slice(indices));
        }
        gpu_mesh.index_count = indices.len() as u32;
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        if desc.depth_test && !self.warned_depth_test {
            log::warn!("WgpuBackend: depth testing is not supported; ignored");
            self.warned_depth_test = true;
        }

        let vs = self.compile("grove quad vertex shader", desc.vertex_source)?;
        let fs = self.compile("grove quad fragment shader", desc.fragment_source)?;
        let attributes = vertex_attributes(&desc.vertex_layout)?;

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grove quad pipeline layout"),
            bind_group_layouts: &[&self.globals_layout, &self.textures_layout],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grove quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: desc.vertex_layout.stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: desc.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.push(GpuPipeline { pipeline });
        Ok(PipelineHandle(self.pipelines.len() as u32 - 1))
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle> {
        ensure!(desc.width > 0 && desc.height > 0, "texture has zero size");
        ensure!(
            desc.pixels.len() == desc.expected_len(),
            "texture {}x{} expects {} bytes, got {}",
            desc.width,
            desc.height,
            desc.expected_len(),
            desc.pixels.len()
        );

        let format = match desc.format {
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
        };
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("grove texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            desc.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * 4),
                rows_per_image: Some(desc.height),
            },
            size,
        );

        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grove texture sampler"),
            address_mode_u: address_mode(desc.wrap_u),
            address_mode_v: address_mode(desc.wrap_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(desc.mag_filter),
            min_filter: filter_mode(desc.min_filter),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.push(GpuTexture {
            _texture: texture,
            view,
            sampler,
        });
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn draw(&mut self, cmd: &DrawCmd<'_>) {
        if self.target.is_none() {
            if !self.warned_no_target {
                log::warn!("WgpuBackend: draw without a bound target; skipped");
                self.warned_no_target = true;
            }
            return;
        }

        // Mutating work happens before the immutable borrows below.
        let globals = self.globals_for(cmd);
        let Some(key) = self.ensure_texture_bind_group(cmd.samplers.textures()) else {
            log::error!("WgpuBackend: no usable textures for draw; skipped");
            return;
        };
        self.queue.write_buffer(&self.globals_ubo, 0, bytemuck::bytes_of(&globals));

        let Some(target) = self.target.as_ref() else {

            return;

        };
        let Some(pipeline) = self.pipelines.get(cmd.pipeline.0 as usize) else {
            log::error!("WgpuBackend: unknown pipeline {:?}", cmd.pipeline);
            return;
        };
        let Some(mesh) = self.meshes.get(cmd.mesh.0 as usize) else {
            log::error!("WgpuBackend: unknown mesh {:?}", cmd.mesh);
            return;
        };
        let Some(textures_bind_group) = self.texture_bind_groups.get(&key) else {
            return;
        };
        if mesh.index_count == 0 {
            return;
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grove quad encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grove quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&pipeline.pipeline);
            rpass.set_bind_group(0, &self.globals_bind_group, &[]);
            rpass.set_bind_group(1, textures_bind_group, &[]);
            rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
            rpass.set_index_buffer(mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn pack_param(value: UniformValue) -> Option<[f32; 4]> {
    match value {
        UniformValue::Float(x) => Some([x, 0.0, 0.0, 0.0]),
        UniformValue::Int(i) => Some([i as f32, 0.0, 0.0, 0.0]),
        UniformValue::Vec2([x, y]) => Some([x, y, 0.0, 0.0]),
        UniformValue::Vec4(v) => Some(v),
        UniformValue::Mat4(_) => None,
    }
}

fn vertex_attributes(layout: &VertexLayout) -> Result<Vec<wgpu::VertexAttribute>> {
    layout
        .attributes
        .iter()
        .map(|a| {
            let format = match (a.ty, a.components) {
                (AttribType::Float32, 1) => wgpu::VertexFormat::Float32,
                (AttribType::Float32, 2) => wgpu::VertexFormat::Float32x2,
                (AttribType::Float32, 3) => wgpu::VertexFormat::Float32x3,
                (AttribType::Float32, 4) => wgpu::VertexFormat::Float32x4,
                (ty, n) => bail!(
                    "unsupported vertex attribute {ty:?} x{n} at location {}",
                    a.location
                ),
            };
            Ok(wgpu::VertexAttribute {
                format,
                offset: a.offset as u64,
                shader_location: a.location,
            })
        })
        .collect()
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::coords::MAT4_IDENTITY;
    use crate::gfx::backend::Uniforms;
    use crate::gfx::renderer2d::QUAD_VERTEX_LAYOUT;

    #[test]
    fn globals_block_matches_wgsl_layout() {
        // mat4x4<f32> + array<vec4<f32>, 4>
        assert_eq!(std::mem::size_of::<Globals>(), 64 + 16 * PARAM_SLOTS);
    }

    #[test]
    fn params_pack_scalars_into_vec4() {
        assert_eq!(pack_param(UniformValue::Float(0.5)), Some([0.5, 0.0, 0.0, 0.0]));
        assert_eq!(pack_param(UniformValue::Int(-3)), Some([-3.0, 0.0, 0.0, 0.0]));
        assert_eq!(pack_param(UniformValue::Vec2([1.0, 2.0])), Some([1.0, 2.0, 0.0, 0.0]));
        assert_eq!(pack_param(UniformValue::Mat4(MAT4_IDENTITY)), None);
    }

    #[test]
    fn quad_layout_maps_to_wgpu_formats() {
        let attrs = vertex_attributes(&QUAD_VERTEX_LAYOUT).unwrap();
        let formats: Vec<_> = attrs.iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            vec![
                wgpu::VertexFormat::Float32x2,
                wgpu::VertexFormat::Float32x4,
                wgpu::VertexFormat::Float32x2,
                wgpu::VertexFormat::Float32,
            ]
        );
        assert_eq!(attrs[3].offset, 32);
        assert_eq!(attrs[3].shader_location, 3);
    }

    #[test]
    fn uniforms_iterate_in_packing_order() {
        let mut extra = BTreeMap::new();
        extra.insert("b".to_string(), UniformValue::Float(2.0));
        extra.insert("a".to_string(), UniformValue::Float(1.0));
        let packed: Vec<_> = Uniforms::new(&MAT4_IDENTITY, &extra)
            .iter()
            .filter(|(n, _)| *n != VIEW_PROJECTION_UNIFORM)
            .filter_map(|(_, v)| pack_param(v))
            .collect();
        assert_eq!(packed, vec![[1.0, 0.0, 0.0, 0.0], [2.0, 0.0, 0.0, 0.0]]);
    }
}
