//! Procedural noise layer for the noise effect.
//!
//! Tileable value noise: a grid of random cell values, smoothly interpolated.
//! The grid holds a whole number of cells across the output, so the last
//! texel column interpolates back into the first and the scrolling,
//! `fract`-wrapped lookup shows no seam. Green and blue are independent fields
//! (the tint weights); red is their mean and alpha is opaque.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NoiseConfig {
    /// Output is `size × size` texels.
    pub size: u32,
    /// Approximate texels per noise cell, rounded so that a whole number of
    /// cells spans `size`. Larger values give smoother noise.
    pub cell: u32,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self { size: 256, cell: 32, seed: 0x6c69_6e74 }
    }
}

impl NoiseConfig {
    /// Grid cells along each axis; the noise repeats exactly every `size` texels.
    pub fn cells(&self) -> u32 {
        let size = self.size.max(1);
        let cell = self.cell.clamp(1, size);
        ((size as f32 / cell as f32).round() as u32).clamp(1, size)
    }
}

/// Generates RGBA8 texels (`size * size * 4` bytes).
pub fn generate_noise(config: &NoiseConfig) -> Vec<u8> {
    let size = config.size.max(1);
    let cells = config.cells() as usize;
    let scale = cells as f32 / size as f32;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let green: Vec<f32> = (0..cells * cells).map(|_| rng.random::<f32>()).collect();
    let blue: Vec<f32> = (0..cells * cells).map(|_| rng.random::<f32>()).collect();

    let mut out = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let p = (x as f32 * scale, y as f32 * scale);
            let g = value_at(&green, cells, p);
            let b = value_at(&blue, cells, p);
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            out.extend_from_slice(&[to_u8((g + b) * 0.5), to_u8(g), to_u8(b), 255]);
        }
    }
    out
}

/// Interpolated grid value at `(gx, gy)` in cell units, wrapping at `cells`.
fn value_at(grid: &[f32], cells: usize, (gx, gy): (f32, f32)) -> f32 {
    let (cx, cy) = (gx.floor(), gy.floor());
    let (sx, sy) = (smoothstep(gx - cx), smoothstep(gy - cy));
    let (cx, cy) = (cx as usize % cells, cy as usize % cells);
    let at = |i: usize, j: usize| grid[(j % cells) * cells + (i % cells)];

    let top = lerp(at(cx, cy), at(cx + 1, cy), sx);
    let bottom = lerp(at(cx, cy + 1), at(cx + 1, cy + 1), sx);
    lerp(top, bottom, sy)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_noise() {
        let c = NoiseConfig { size: 16, cell: 4, seed: 7 };
        assert_eq!(generate_noise(&c), generate_noise(&c));
        assert_ne!(generate_noise(&c), generate_noise(&NoiseConfig { seed: 8, ..c }));
    }

    #[test]
    fn texels_are_opaque_and_red_is_the_mean() {
        let data = generate_noise(&NoiseConfig { size: 8, cell: 2, seed: 1 });
        assert_eq!(data.len(), 8 * 8 * 4);
        for px in data.chunks_exact(4) {
            assert_eq!(px[3], 255);
            let mean = (px[1] as i32 + px[2] as i32) / 2;
            assert!((px[0] as i32 - mean).abs() <= 1);
        }
    }

    /// Largest per-channel step between horizontally adjacent texels:
    /// `(interior, across the wrap from the last column to the first)`.
    fn steps(config: &NoiseConfig) -> (i32, i32) {
        let size = config.size as usize;
        let data = generate_noise(config);
        let green = |x: usize, y: usize| data[(y * size + x) * 4 + 1] as i32;
        let mut interior = 0;
        let mut wrap = 0;
        for y in 0..size {
            for x in 0..size - 1 {
                interior = interior.max((green(x + 1, y) - green(x, y)).abs());
            }
            wrap = wrap.max((green(0, y) - green(size - 1, y)).abs());
        }
        (interior, wrap)
    }

    #[test]
    fn wraps_without_a_seam_when_cell_does_not_divide_size() {
        for (size, cell) in [(100, 32), (10, 4), (256, 32), (1024, 32)] {
            let config = NoiseConfig { size, cell, seed: 9 };
            let (interior, wrap) = steps(&config);
            assert!(wrap <= interior + 1, "size={size} cell={cell}: wrap {wrap} vs interior {interior}");
        }
    }

    #[test]
    fn cells_divide_the_period_exactly() {
        assert_eq!(NoiseConfig { size: 100, cell: 32, seed: 0 }.cells(), 3);
        assert_eq!(NoiseConfig { size: 10, cell: 4, seed: 0 }.cells(), 3);
        assert_eq!(NoiseConfig { size: 256, cell: 32, seed: 0 }.cells(), 8);
        assert_eq!(NoiseConfig { size: 8, cell: 100, seed: 0 }.cells(), 1);
        assert_eq!(NoiseConfig { size: 4, cell: 0, seed: 0 }.cells(), 4);
    }

    #[test]
    fn cell_corners_hit_grid_values() {
        // At a cell corner the interpolation weight is zero.
        let c = NoiseConfig { size: 8, cell: 4, seed: 3 };
        let data = generate_noise(&c);
        let mut rng = StdRng::seed_from_u64(3);
        let g0: f32 = rng.random();
        assert_eq!(data[1], (g0 * 255.0).round() as u8);
    }
}
