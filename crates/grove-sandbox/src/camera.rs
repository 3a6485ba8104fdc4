use grove_engine::coords::{Mat4, MAT4_IDENTITY};

/// Orthographic 2D camera with +Y pointing down the screen.
///
/// `position` is the world point at the centre of the viewport. Zoom > 1
/// magnifies. The view-projection is column-major and cached until a setter
/// invalidates it.
#[derive(Debug, Clone)]
pub struct OrthoCamera2D {
    half_width: f32,
    half_height: f32,
    position: [f32; 2],
    rotation: f32,
    zoom: f32,
    view_projection: Mat4,
    dirty: bool,
}

pub const MIN_ZOOM: f32 = 0.05;

impl OrthoCamera2D {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            half_width: viewport_width * 0.5,
            half_height: viewport_height * 0.5,
            position: [0.0, 0.0],
            rotation: 0.0,
            zoom: 1.0,
            view_projection: MAT4_IDENTITY,
            dirty: true,
        }
    }

    /// Camera whose world units are screen pixels with the origin at the top-left.
    pub fn screen(viewport_width: f32, viewport_height: f32) -> Self {
        let mut cam = Self::new(viewport_width, viewport_height);
        cam.position = [viewport_width * 0.5, viewport_height * 0.5];
        cam
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let (hw, hh) = (width * 0.5, height * 0.5);
        if hw != self.half_width || hh != self.half_height {
            self.half_width = hw;
            self.half_height = hh;
            self.dirty = true;
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = [x, y];
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.dirty = true;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(MIN_ZOOM);
        self.dirty = true;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_projection(&mut self) -> Mat4 {
        if self.dirty {
            self.recalculate();
        }
        self.view_projection
    }

    fn recalculate(&mut self) {
        let hw = self.half_width / self.zoom;
        let hh = self.half_height / self.zoom;
        // Bottom/top swapped: larger world y is lower on screen.
        let proj = ortho(-hw, hw, hh, -hh);
        let view = mul(
            &rotate_z(-self.rotation),
            &translation(-self.position[0], -self.position[1]),
        );
        self.view_projection = mul(&proj, &view);
        self.dirty = false;
    }
}

// ── column-major helpers ──────────────────────────────────────────────────

fn translation(x: f32, y: f32) -> Mat4 {
    let mut m = MAT4_IDENTITY;
    m[12] = x;
    m[13] = y;
    m
}

fn rotate_z(a: f32) -> Mat4 {
    let (s, c) = a.sin_cos();
    let mut m = MAT4_IDENTITY;
    m[0] = c;
    m[1] = s;
    m[4] = -s;
    m[5] = c;
    m
}

/// Maps x in `[l, r]` and y in `[b, t]` to NDC `[-1, 1]`; z stays 0.
fn ortho(l: f32, r: f32, b: f32, t: f32) -> Mat4 {
    let mut m = MAT4_IDENTITY;
    m[0] = 2.0 / (r - l);
    m[5] = 2.0 / (t - b);
    m[12] = -(r + l) / (r - l);
    m[13] = -(t + b) / (t - b);
    m
}

fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

/// `m * (x, y, 0, 1)`, returning clip x/y.
#[cfg(test)]
fn transform(m: &Mat4, x: f32, y: f32) -> [f32; 2] {
    [
        m[0] * x + m[4] * y + m[12],
        m[1] * x + m[5] * y + m[13],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    #[test]
    fn screen_camera_maps_viewport_corners_to_ndc_corners() {
        let mut cam = OrthoCamera2D::screen(800.0, 600.0);
        let vp = cam.view_projection();
        assert!(close(transform(&vp, 0.0, 0.0), [-1.0, 1.0]));
        assert!(close(transform(&vp, 800.0, 0.0), [1.0, 1.0]));
        assert!(close(transform(&vp, 0.0, 600.0), [-1.0, -1.0]));
        assert!(close(transform(&vp, 800.0, 600.0), [1.0, -1.0]));
    }

    #[test]
    fn centred_camera_maps_origin_to_ndc_centre() {
        let mut cam = OrthoCamera2D::new(200.0, 100.0);
        let vp = cam.view_projection();
        assert!(close(transform(&vp, 0.0, 0.0), [0.0, 0.0]));
        assert!(close(transform(&vp, 100.0, 50.0), [1.0, -1.0]));
    }

    #[test]
    fn zoom_magnifies_and_is_clamped() {
        let mut cam = OrthoCamera2D::new(200.0, 100.0);
        cam.set_zoom(2.0);
        let vp = cam.view_projection();
        assert!(close(transform(&vp, 50.0, 25.0), [1.0, -1.0]));

        cam.set_zoom(0.0);
        assert_eq!(cam.zoom(), MIN_ZOOM);
    }

    #[test]
    fn translation_moves_the_view_centre() {
        let mut cam = OrthoCamera2D::new(200.0, 100.0);
        cam.set_position(30.0, -10.0);
        let vp = cam.view_projection();
        assert!(close(transform(&vp, 30.0, -10.0), [0.0, 0.0]));
    }

    #[test]
    fn rotation_turns_the_world_opposite_to_the_camera() {
        let mut cam = OrthoCamera2D::new(2.0, 2.0);
        cam.set_rotation(std::f32::consts::FRAC_PI_2);
        let vp = cam.view_projection();
        // World +x ends up pointing up the screen.
        assert!(close(transform(&vp, 1.0, 0.0), [0.0, 1.0]));
    }

    #[test]
    fn mul_with_identity_is_identity() {
        let t = translation(3.0, 4.0);
        assert_eq!(mul(&MAT4_IDENTITY, &t), t);
        assert_eq!(mul(&t, &MAT4_IDENTITY), t);
    }
}
