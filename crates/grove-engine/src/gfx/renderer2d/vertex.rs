//! Quad vertex format and corner generation.
//!
//! Corner order is TL, TR, BL, BR (top = smaller y, +Y down). The top-left
//! corner takes `(u0, v0)`, matching a texture whose row 0 is the top row.
//! Triangles `[0, 2, 1]` and `[1, 2, 3]` are counter-clockwise on screen.

use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::gfx::backend::{AttribType, VertexAttrib, VertexLayout};

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Index pattern of one quad, relative to its first vertex.
pub const QUAD_INDEX_PATTERN: [u32; INDICES_PER_QUAD] = [0, 2, 1, 1, 2, 3];

/// Vertex layout (36 bytes):
///
///  offset  0  position  [f32; 2]  loc 0
///  offset  8  color     [f32; 4]  loc 1
///  offset 24  uv        [f32; 2]  loc 2
///  offset 32  tex_slot  f32       loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    /// Slot index stored as float; the fragment stage rounds it.
    pub tex_slot: f32,
}

const fn float_attrib(location: u32, components: u32, offset: u32) -> VertexAttrib {
    VertexAttrib {
        location,
        components,
        ty: AttribType::Float32,
        offset,
    }
}

const QUAD_VERTEX_ATTRIBS: [VertexAttrib; 4] = [
    float_attrib(0, 2, 0),
    float_attrib(1, 4, 8),
    float_attrib(2, 2, 24),
    float_attrib(3, 1, 32),
];

pub const QUAD_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: std::mem::size_of::<QuadVertex>() as u32,
    attributes: &QUAD_VERTEX_ATTRIBS,
};

/// Normalized texture rectangle. `(u0, v0)` is the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// World-space corners (TL, TR, BL, BR) of a `w`×`h` quad centred on `center`,
/// rotated by `rotation` radians around its centre.
pub fn quad_corners(center: Vec2, w: f32, h: f32, rotation: f32) -> [Vec2; VERTICES_PER_QUAD] {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let (sin, cos) = rotation.sin_cos();

    [
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(-hw, hh),
        Vec2::new(hw, hh),
    ]
    .map(|p| p.rotated_by(cos, sin) + center)
}

/// Appends one quad's vertices and indices.
///
/// Callers guarantee capacity; neither vector grows past what it was sized to.
pub(super) fn push_quad(
    vertices: &mut Vec<QuadVertex>,
    indices: &mut Vec<u32>,
    corners: [Vec2; VERTICES_PER_QUAD],
    color: [f32; 4],
    uv: UvRect,
    slot: usize,
) {
    let base = vertices.len() as u32;
    let tex_slot = slot as f32;
    let uvs = [[uv.u0, uv.v0], [uv.u1, uv.v0], [uv.u0, uv.v1], [uv.u1, uv.v1]];

    for (p, uv) in corners.into_iter().zip(uvs) {
        vertices.push(QuadVertex {
            position: [p.x, p.y],
            color,
            uv,
            tex_slot,
        });
    }
    indices.extend(QUAD_INDEX_PATTERN.iter().map(|i| base + i));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn layout_matches_backend_contract() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 36);
        assert_eq!(QUAD_VERTEX_LAYOUT.stride, 36);
        let offsets: Vec<_> = QUAD_VERTEX_LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 24, 32]);
        let sizes: Vec<_> = QUAD_VERTEX_LAYOUT.attributes.iter().map(|a| a.components).collect();
        assert_eq!(sizes, vec![2, 4, 2, 1]);
    }

    #[test]
    fn unrotated_corners_are_axis_aligned() {
        let c = quad_corners(Vec2::new(10.0, 20.0), 4.0, 6.0, 0.0);
        assert_eq!(c[0], Vec2::new(8.0, 17.0));
        assert_eq!(c[1], Vec2::new(12.0, 17.0));
        assert_eq!(c[2], Vec2::new(8.0, 23.0));
        assert_eq!(c[3], Vec2::new(12.0, 23.0));
    }

    #[test]
    fn quarter_turn_rotates_around_centre() {
        let c = quad_corners(Vec2::new(5.0, 5.0), 4.0, 2.0, std::f32::consts::FRAC_PI_2);
        // TL (-2, -1) -> (1, -2)
        assert!(close(c[0], Vec2::new(6.0, 3.0)));
        // BR (2, 1) -> (-1, 2)
        assert!(close(c[3], Vec2::new(4.0, 7.0)));
    }

    #[test]
    fn push_quad_offsets_indices_by_existing_vertices() {
        let mut v = Vec::new();
        let mut i = Vec::new();
        let corners = quad_corners(Vec2::zero(), 1.0, 1.0, 0.0);
        push_quad(&mut v, &mut i, corners, [1.0; 4], UvRect::FULL, 0);
        push_quad(&mut v, &mut i, corners, [1.0; 4], UvRect::FULL, 3);

        assert_eq!(v.len(), 8);
        assert_eq!(i, vec![0, 2, 1, 1, 2, 3, 4, 6, 5, 5, 6, 7]);
        assert_eq!(v[4].tex_slot, 3.0);
    }

    #[test]
    fn push_quad_assigns_uv_per_corner() {
        let mut v = Vec::new();
        let mut i = Vec::new();
        let uv = UvRect::new(0.25, 0.5, 0.75, 1.0);
        push_quad(&mut v, &mut i, quad_corners(Vec2::zero(), 2.0, 2.0, 0.0), [1.0; 4], uv, 1);

        let uvs: Vec<_> = v.iter().map(|q| q.uv).collect();
        assert_eq!(uvs, vec![[0.25, 0.5], [0.75, 0.5], [0.25, 1.0], [0.75, 1.0]]);
    }

    #[test]
    fn triangles_wind_counter_clockwise_on_screen() {
        let c = quad_corners(Vec2::zero(), 2.0, 2.0, 0.0);
        for tri in QUAD_INDEX_PATTERN.chunks(3) {
            let (a, b, d) = (c[tri[0] as usize], c[tri[1] as usize], c[tri[2] as usize]);
            // Flip y to get the on-screen (y up) orientation.
            let cross = (b.x - a.x) * -(d.y - a.y) - -(b.y - a.y) * (d.x - a.x);
            assert!(cross > 0.0);
        }
    }
}
