//! Procedurally generated sandbox textures.

use grove_engine::paint::Color;

/// Two-colour checkerboard, `cells`×`cells` squares of `cell` pixels each.
pub fn checker(cells: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> (u32, Vec<u8>) {
    let size = cells * cell;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let even = (x / cell + y / cell) % 2 == 0;
            pixels.extend_from_slice(if even { &a } else { &b });
        }
    }
    (size, pixels)
}

/// Atlas of `cols`×`rows` flat-colour tiles with a 1px dark border each.
pub fn tile_atlas(cols: u32, rows: u32, tile: u32) -> (u32, u32, Vec<u8>) {
    let (w, h) = (cols * tile, rows * tile);
    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let (tx, ty) = (x / tile, y / tile);
            let (lx, ly) = (x % tile, y % tile);
            let border = lx == 0 || ly == 0 || lx == tile - 1 || ly == tile - 1;
            let rgba = if border {
                [20, 20, 24, 255]
            } else {
                let hue = (ty * cols + tx) as f32 / (cols * rows) as f32;
                hsv(hue, 0.6, 0.95).to_rgba8()
            };
            pixels.extend_from_slice(&rgba);
        }
    }
    (w, h, pixels)
}

/// HSV to straight-alpha color; `h` in turns.
pub fn hsv(h: f32, s: f32, v: f32) -> Color {
    let h = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    Color::new(r + m, g + m, b + m, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates_cells() {
        let (size, px) = checker(2, 2, [255; 4], [0, 0, 0, 255]);
        assert_eq!(size, 4);
        assert_eq!(px.len(), 4 * 4 * 4);
        assert_eq!(&px[0..4], &[255; 4]);
        // (2, 0) is in the second cell.
        assert_eq!(&px[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn atlas_has_borders() {
        let (w, h, px) = tile_atlas(2, 2, 8);
        assert_eq!((w, h), (16, 16));
        assert_eq!(&px[0..4], &[20, 20, 24, 255]);
        let centre = ((4 * w + 4) * 4) as usize;
        assert_ne!(&px[centre..centre + 4], &[20, 20, 24, 255]);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv(0.0, 1.0, 1.0), Color::RED);
        assert_eq!(hsv(1.0 / 3.0, 1.0, 1.0).to_rgba8(), [0, 255, 0, 255]);
        assert_eq!(hsv(0.5, 0.0, 1.0), Color::WHITE);
    }
}
