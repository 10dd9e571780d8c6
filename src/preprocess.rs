//! Terrain preprocessing between acquisition and plotting: normalize the
//! grid, mask water and lakes out as gaps, scale the relief, and flip it
//! into drawing order.

use rayon::prelude::*;

use crate::grid::Grid;

/// Water cells are those strictly below the `water_ntile` percentile of the
/// normalized grid; lake cells are those whose 3x3 neighborhood is flatter
/// than `lake_flatness` on a 0-255 quantization. Both (and any holes in the
/// source data) become NaN and are drawn as gaps. The remaining values are
/// scaled to [0, vertical_ratio] and the rows flipped so row 0 is the
/// northernmost (back) line.
pub fn preprocess(mut grid: Grid, lake_flatness: f32, water_ntile: u32, vertical_ratio: u32) -> Grid {
    let holes: Vec<bool> = grid.data.iter().map(|v| !v.is_finite()).collect();
    let min = grid.finite_min().unwrap_or(0.0);
    let max = grid.finite_max().unwrap_or(0.0);
    let range = max - min;

    // Fill holes with the minimum so normalization and the masks see a full
    // grid; a flat box normalizes to all zeros.
    for v in &mut grid.data {
        if !v.is_finite() {
            *v = min;
        }
        *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
    }

    let water_cut = grid.finite_percentile(water_ntile as f32).unwrap_or(0.0);
    let lake = flatness_mask(&grid, lake_flatness);

    for (i, v) in grid.data.iter_mut().enumerate() {
        if holes[i] || lake[i] || *v < water_cut {
            *v = f32::NAN;
        } else {
            *v *= vertical_ratio as f32;
        }
    }

    grid.flip_rows();
    grid
}

/// 3x3 local gradient (max - min) on a u8 quantization of the normalized
/// grid, strictly below the threshold. Edges clamp.
fn flatness_mask(grid: &Grid, lake_flatness: f32) -> Vec<bool> {
    let (w, h) = (grid.w, grid.h);
    let quant: Vec<u8> = grid
        .data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    let mut mask = vec![false; w * h];
    mask.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let mut lo = u8::MAX;
            let mut hi = u8::MIN;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as usize;
                    let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as usize;
                    let q = quant[ny * w + nx];
                    lo = lo.min(q);
                    hi = hi.max(q);
                }
            }
            row[x] = ((hi - lo) as f32) < lake_flatness;
        }
    });
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> Grid {
        // Values rise monotonically with the row index.
        let data = (0..w * h).map(|i| (i / w) as f32 * 100.0).collect();
        Grid::from_data(w, h, data)
    }

    #[test]
    fn defaults_mask_nothing_and_scale_to_ratio() {
        let out = preprocess(ramp(4, 5), 0.0, 0, 200);
        assert!(out.data.iter().all(|v| v.is_finite()));
        assert_eq!(out.finite_min(), Some(0.0));
        assert_eq!(out.finite_max(), Some(200.0));
    }

    #[test]
    fn rows_are_flipped_north_first() {
        // Input row 0 is the southern (lowest) edge; output row 0 must be
        // the northern (highest) one.
        let out = preprocess(ramp(4, 5), 0.0, 0, 100);
        assert_eq!(out.get(0, 0), 100.0);
        assert_eq!(out.get(0, 4), 0.0);
    }

    #[test]
    fn water_percentile_masks_the_low_end() {
        let out = preprocess(ramp(4, 10), 0.0, 50, 100);
        let masked = out.data.iter().filter(|v| v.is_nan()).count();
        // Rows strictly below the median value go under water.
        assert_eq!(masked, 4 * 5);
        // The surviving minimum sits at the median, the maximum at the top.
        assert!(out.finite_min().unwrap() >= 50.0 - 1.0);
        assert_eq!(out.finite_max(), Some(100.0));
    }

    #[test]
    fn flat_regions_become_lakes_but_slopes_survive() {
        // Left half flat at 0.3 of the range, right half a steep ramp.
        let (w, h) = (16, 8);
        let mut data = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                data[y * w + x] = if x < 8 { 300.0 } else { (x * y) as f32 * 20.0 };
            }
        }
        let out = preprocess(Grid::from_data(w, h, data), 4.0, 0, 100);
        assert!(out.get(2, 3).is_nan(), "flat plateau should be masked");
        assert!(out.get(14, 1).is_finite(), "steep terrain should survive");
    }

    #[test]
    fn holes_stay_holes() {
        let mut g = ramp(4, 5);
        g.set(1, 2, f32::NAN);
        let out = preprocess(g, 0.0, 0, 100);
        // Row 2 flips to row h-1-2 = 2 for h=5.
        assert!(out.get(1, 2).is_nan());
        assert_eq!(out.data.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn flat_grid_degenerates_to_zero_lines() {
        let out = preprocess(Grid::from_data(4, 4, vec![7.0; 16]), 0.0, 0, 200);
        // Everything is "flat" only if lake_flatness asks for it; with the
        // default threshold the grid survives as all zeros.
        assert!(out.data.iter().all(|&v| v == 0.0));
    }
}
