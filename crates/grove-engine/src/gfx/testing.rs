//! In-memory backend that records every submission for assertions.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use anyhow::{bail, Result};

use super::backend::{
    DrawCmd, GpuBackend, MeshDesc, MeshHandle, PipelineDesc, PipelineHandle, TextureDesc,
    TextureHandle, UniformValue,
};
use super::renderer2d::QuadVertex;

/// Snapshot of one `draw` call.
#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub pipeline: PipelineHandle,
    pub mesh: MeshHandle,
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<u32>,
    pub uniforms: Vec<(String, UniformValue)>,
    pub samplers: Vec<(String, TextureHandle)>,
}

impl RecordedDraw {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn textures(&self) -> Vec<TextureHandle> {
        self.samplers.iter().map(|(_, t)| *t).collect()
    }
}

#[derive(Debug, Default)]
struct MeshRecord {
    vertex_capacity: usize,
    index_capacity: usize,
    vertices: Vec<QuadVertex>,
    indices: Vec<u32>,
}

/// Backend double. `fail_*` flags make the matching call return an error.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub fail_pipeline: bool,
    pub fail_texture: bool,
    pub fail_mesh: bool,
    pub fail_update: bool,

    pub draws: Vec<RecordedDraw>,
    pub mesh_updates: usize,
    pub pipelines: Vec<(String, String, bool, bool)>,
    pub textures: Vec<(u32, u32, Vec<u8>)>,

    meshes: Vec<MeshRecord>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_quad_counts(&self) -> Vec<usize> {
        self.draws.iter().map(RecordedDraw::quad_count).collect()
    }

    /// Creates an RGBA texture filled with `rgba`.
    pub fn solid_texture(&mut self, rgba: [u8; 4]) -> TextureHandle {
        let pixels: Vec<u8> = rgba.repeat(4);
        match self.create_texture(&TextureDesc::rgba8(2, 2, &pixels)) {
            Ok(t) => t,
            Err(e) => panic!("recording backend refused a texture: {e:#}"),
        }
    }
}

fn decode_vertices(bytes: &[u8]) -> Vec<QuadVertex> {
    bytes
        .chunks_exact(std::mem::size_of::<QuadVertex>())
        .map(bytemuck::pod_read_unaligned::<QuadVertex>)
        .collect()
}

impl GpuBackend for RecordingBackend {
    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshHandle> {
        if self.fail_mesh {
            bail!("mesh allocation refused");
        }
        let stride = desc.layout.stride as usize;
        self.meshes.push(MeshRecord {
            vertex_capacity: desc.vertices.len() / stride,
            index_capacity: desc.indices.len(),
            ..MeshRecord::default()
        });
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[u8], indices: &[u32]) -> Result<()> {
        if self.fail_update {
            bail!("mesh upload refused");
        }
        let Some(record) = self.meshes.get_mut(mesh.0 as usize) else {
            bail!("unknown mesh {mesh:?}");
        };
        let vertices = decode_vertices(vertices);
        if vertices.len() > record.vertex_capacity || indices.len() > record.index_capacity {
            bail!("mesh upload exceeds capacity");
        }
        record.vertices = vertices;
        record.indices = indices.to_vec();
        self.mesh_updates += 1;
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        if self.fail_pipeline {
            bail!("shader link failed");
        }
        self.pipelines.push((
            desc.vertex_source.to_string(),
            desc.fragment_source.to_string(),
            desc.depth_test,
            desc.blend,
        ));
        Ok(PipelineHandle(self.pipelines.len() as u32 - 1))
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle> {
        if self.fail_texture {
            bail!("texture upload refused");
        }
        if desc.pixels.len() != desc.expected_len() {
            bail!("pixel data has wrong length");
        }
        self.textures.push((desc.width, desc.height, desc.pixels.to_vec()));
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn draw(&mut self, cmd: &DrawCmd<'_>) {
        let mesh = &self.meshes[cmd.mesh.0 as usize];
        self.draws.push(RecordedDraw {
            pipeline: cmd.pipeline,
            mesh: cmd.mesh,
            vertices: mesh.vertices.clone(),
            indices: mesh.indices.clone(),
            uniforms: cmd.uniforms.iter().map(|(n, v)| (n.to_string(), v)).collect(),
            samplers: cmd.samplers.iter().map(|(n, t)| (n.to_string(), t)).collect(),
        });
    }
}

/// Test-binary allocator that counts allocations made on the calling thread
/// while [`count_allocations`] is running. Other threads are not counted, so
/// parallel tests do not disturb each other.
struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<Option<usize>> = const { Cell::new(None) };
}

fn note_allocation() {
    let _ = ALLOCATIONS.try_with(|count| {
        if let Some(n) = count.get() {
            count.set(Some(n + 1));
        }
    });
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        note_allocation();
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        note_allocation();
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Runs `f` and returns the number of heap allocations it made on this thread.
pub fn count_allocations<F: FnOnce()>(f: F) -> usize {
    ALLOCATIONS.with(|count| count.set(Some(0)));
    f();
    ALLOCATIONS.with(|count| count.replace(None)).unwrap_or(0)
}
