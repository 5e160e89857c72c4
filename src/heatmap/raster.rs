//! CPU rendition of the heatmap strip.
//!
//! Produces the same picture as the GPU pipeline without needing an adapter,
//! which is what headless export falls back to.

use super::gradient::{to_rgba8, Gradient};
use image::RgbaImage;
use rayon::prelude::*;

/// Largest bitmap either export path will produce on a side.
pub const MAX_BITMAP_RESOLUTION: u32 = 8192;

pub fn clamp_bitmap_size(width: u32, height: u32) -> (u32, u32) {
    (
        width.clamp(1, MAX_BITMAP_RESOLUTION),
        height.clamp(1, MAX_BITMAP_RESOLUTION),
    )
}

/// Samples `speeds` at `u` in `[0, 1]` with clamp-to-edge linear filtering,
/// matching a linearly filtered 1-D texture lookup.
pub fn sample_speed(speeds: &[f32], u: f32) -> f32 {
    match speeds.len() {
        0 => 0.0,
        1 => speeds[0],
        n => {
            let x = (u.clamp(0.0, 1.0) * n as f32 - 0.5).clamp(0.0, (n - 1) as f32);
            let i0 = x.floor() as usize;
            let i1 = (i0 + 1).min(n - 1);
            let f = x - i0 as f32;
            speeds[i0] + (speeds[i1] - speeds[i0]) * f
        }
    }
}

pub fn rasterize(speeds: &[f32], gradient: &Gradient, width: u32, height: u32) -> RgbaImage {
    let (width, height) = clamp_bitmap_size(width, height);

    // one color per column, the rows only fade it
    let columns: Vec<[f32; 4]> = (0..width)
        .map(|x| {
            let u = (x as f32 + 0.5) / width as f32;
            gradient.compute_color_uncached(sample_speed(speeds, u))
        })
        .collect();

    let mut img = RgbaImage::new(width, height);
    let row_len = width as usize * 4;
    img.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / height as f32;
            for (px, c) in row.chunks_exact_mut(4).zip(columns.iter()) {
                let rgba = to_rgba8([c[0] * v, c[1] * v, c[2] * v, 1.0]);
                px.copy_from_slice(&rgba);
            }
        });
    img
}
