// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalization (CLAHE) on a single 8-bit
// channel.

use image::{GrayImage, Luma};
use tracing::debug;

/// Number of intensity levels in an 8-bit channel.
const LEVELS: usize = 256;

/// Equalize `channel` with CLAHE.
///
/// The image is split into a `grid` x `grid` set of tiles (fewer when the
/// image is narrower than the grid). Each tile's histogram is clipped at
/// `clip_limit` times the uniform bin height, the clipped excess is spread
/// back over all bins, and the resulting CDF becomes the tile's lookup table.
/// Every output pixel bilinearly blends the lookup tables of the four tiles
/// whose centres surround it, which removes the blocking a per-tile mapping
/// would leave behind.
pub fn equalize_adaptive(channel: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = channel.dimensions();
    if width == 0 || height == 0 {
        return channel.clone();
    }

    let tiles_x = grid.clamp(1, width);
    let tiles_y = grid.clamp(1, height);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = tile_bounds(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = tile_bounds(tx, tiles_x, width);
            luts.push(tile_lut(channel, (x0, x1), (y0, y1), clip_limit));
        }
    }
    debug!(tiles_x, tiles_y, clip_limit, "CLAHE tile lookup tables built");

    let columns = interpolation_weights(width, tiles_x);
    let rows = interpolation_weights(height, tiles_y);
    let stride = tiles_x as usize;

    GrayImage::from_fn(width, height, |x, y| {
        let value = channel.get_pixel(x, y).0[0] as usize;
        let (tx0, tx1, ax) = columns[x as usize];
        let (ty0, ty1, ay) = rows[y as usize];

        let top_left = luts[ty0 * stride + tx0][value] as f32;
        let top_right = luts[ty0 * stride + tx1][value] as f32;
        let bottom_left = luts[ty1 * stride + tx0][value] as f32;
        let bottom_right = luts[ty1 * stride + tx1][value] as f32;

        let top = top_left * (1.0 - ax) + top_right * ax;
        let bottom = bottom_left * (1.0 - ax) + bottom_right * ax;
        let blended = top * (1.0 - ay) + bottom * ay;

        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Half-open pixel range covered by tile `index` of `tiles` along an axis of
/// `len` pixels. Ranges are contiguous and non-empty while `tiles <= len`.
fn tile_bounds(index: u32, tiles: u32, len: u32) -> (u32, u32) {
    let start = (index as u64 * len as u64 / tiles as u64) as u32;
    let end = ((index as u64 + 1) * len as u64 / tiles as u64) as u32;
    (start, end)
}

/// Clipped-histogram equalization lookup table for one tile.
fn tile_lut(
    channel: &GrayImage,
    (x0, x1): (u32, u32),
    (y0, y1): (u32, u32),
    clip_limit: f32,
) -> [u8; LEVELS] {
    let mut histogram = [0u32; LEVELS];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[channel.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    let clip = ((clip_limit * area as f32 / LEVELS as f32) as u32).max(1);

    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    // Spread the clipped mass evenly, then hand out the remainder at a fixed
    // stride so it does not pile up in the dark bins.
    let per_bin = excess / LEVELS as u32;
    let residual = (excess % LEVELS as u32) as usize;
    for bin in histogram.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (LEVELS / residual).max(1);
        for bin in histogram.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; LEVELS];
    let mut cumulative = 0u32;
    for (level, &count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[level] = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// For each pixel along an axis: the two neighbouring tile indices and the
/// weight of the second one. Pixels outside the outermost tile centres clamp
/// to that tile.
fn interpolation_weights(len: u32, tiles: u32) -> Vec<(usize, usize, f32)> {
    let tile_len = len as f32 / tiles as f32;
    let last = tiles as usize - 1;

    (0..len)
        .map(|p| {
            let position = (p as f32 + 0.5) / tile_len - 0.5;
            if position <= 0.0 {
                return (0, 0, 0.0);
            }
            let lower = position.floor() as usize;
            if lower >= last {
                return (last, last, 0.0);
            }
            (lower, lower + 1, position - lower as f32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_dimensions() {
        let img = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let out = equalize_adaptive(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn stretches_low_contrast_gradient() {
        // A faint horizontal gradient between 100 and 131.
        let img = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x / 2) as u8]));
        let out = equalize_adaptive(&img, 4.0, 2);

        let min_in = img.pixels().map(|p| p.0[0]).min().unwrap();
        let max_in = img.pixels().map(|p| p.0[0]).max().unwrap();
        let min_out = out.pixels().map(|p| p.0[0]).min().unwrap();
        let max_out = out.pixels().map(|p| p.0[0]).max().unwrap();

        assert!(
            max_out - min_out > max_in - min_in,
            "range should widen: in {min_in}..{max_in}, out {min_out}..{max_out}"
        );
    }

    #[test]
    fn tiny_image_uses_fewer_tiles() {
        let img = GrayImage::from_pixel(3, 2, Luma([90]));
        let out = equalize_adaptive(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn empty_image_passes_through() {
        let img = GrayImage::new(0, 0);
        assert_eq!(equalize_adaptive(&img, 2.0, 8).dimensions(), (0, 0));
    }

    #[test]
    fn tile_bounds_cover_axis() {
        let bounds: Vec<_> = (0..8).map(|i| tile_bounds(i, 8, 50)).collect();
        assert_eq!(bounds.first().unwrap().0, 0);
        assert_eq!(bounds.last().unwrap().1, 50);
        for pair in bounds.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
            assert!(pair[0].0 < pair[0].1);
        }
    }

    #[test]
    fn lut_is_monotonic() {
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 16 + y) as u8]));
        let lut = tile_lut(&img, (0, 16), (0, 16), 2.0);
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn interpolation_clamps_at_edges() {
        let weights = interpolation_weights(16, 4);
        assert_eq!(weights[0], (0, 0, 0.0));
        assert_eq!(weights[15], (3, 3, 0.0));
        let (lo, hi, a) = weights[6];
        assert_eq!((lo, hi), (1, 2));
        assert!(a > 0.0 && a < 1.0);
    }
}
