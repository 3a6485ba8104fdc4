use crate::gfx::backend::TextureHandle;

use super::vertex::UvRect;

/// Region of a texture atlas addressed by normalized UVs.
///
/// `(u0, v0)` is the top-left of the region, `(u1, v1)` the bottom-right,
/// measured from the top-left texel of the atlas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubTexture {
    pub texture: TextureHandle,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl SubTexture {
    /// The whole texture.
    pub fn full(texture: TextureHandle) -> Self {
        Self::from_uv(texture, UvRect::FULL)
    }

    pub fn from_uv(texture: TextureHandle, uv: UvRect) -> Self {
        Self {
            texture,
            u0: uv.u0,
            v0: uv.v0,
            u1: uv.u1,
            v1: uv.v1,
        }
    }

    /// Region `x, y, w, h` in pixels of an `atlas_w`×`atlas_h` atlas.
    pub fn from_pixels(
        texture: TextureHandle,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        atlas_w: u32,
        atlas_h: u32,
    ) -> Self {
        let aw = atlas_w as f32;
        let ah = atlas_h as f32;
        Self {
            texture,
            u0: x as f32 / aw,
            v0: y as f32 / ah,
            u1: (x + w) as f32 / aw,
            v1: (y + h) as f32 / ah,
        }
    }

    /// Cell `(cx, cy)` of a grid of `cell_w`×`cell_h` tiles.
    pub fn from_grid(
        texture: TextureHandle,
        cx: u32,
        cy: u32,
        cell_w: u32,
        cell_h: u32,
        atlas_w: u32,
        atlas_h: u32,
    ) -> Self {
        Self::from_pixels(texture, cx * cell_w, cy * cell_h, cell_w, cell_h, atlas_w, atlas_h)
    }

    #[inline]
    pub fn uv_rect(&self) -> UvRect {
        UvRect::new(self.u0, self.v0, self.u1, self.v1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATLAS: TextureHandle = TextureHandle(3);

    #[test]
    fn from_pixels_normalizes_by_atlas_size() {
        let s = SubTexture::from_pixels(ATLAS, 32, 16, 32, 16, 128, 64);
        assert_eq!(s.texture, ATLAS);
        assert_eq!(s.uv_rect(), UvRect::new(0.25, 0.25, 0.5, 0.5));
    }

    #[test]
    fn from_grid_addresses_cells() {
        let s = SubTexture::from_grid(ATLAS, 1, 2, 16, 16, 64, 64);
        assert_eq!(s, SubTexture::from_pixels(ATLAS, 16, 32, 16, 16, 64, 64));
        assert_eq!(s.uv_rect(), UvRect::new(0.25, 0.5, 0.5, 0.75));
    }

    #[test]
    fn full_covers_unit_square() {
        assert_eq!(SubTexture::full(ATLAS).uv_rect(), UvRect::FULL);
    }
}
