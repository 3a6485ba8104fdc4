/// Column-major 4x4 matrix, laid out the way WGSL `mat4x4<f32>` expects.
///
/// The renderer never inspects it; it is forwarded verbatim as the
/// view-projection uniform of every draw.
pub type Mat4 = [f32; 16];

pub const MAT4_IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];
