//! Ridge-plot rendering: stacked elevation profiles drawn back to front,
//! each line occluding the ones behind it, colored along a selected scale.

use ab_glyph::{FontRef, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rayon::prelude::*;

use crate::config::Params;
use crate::error::{Error, Result};
use crate::grid::Grid;

/// Output figure size, fixed.
pub const FIG_WIDTH: u32 = 1200;
pub const FIG_HEIGHT: u32 = 800;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL_COLOR: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// Baseline drop between successive lines, in profile units. Preprocessed
/// elevations share the same units (0..vertical_ratio), which is what makes
/// the vertical-ratio slider read as exaggeration.
const LINE_SPACING: f32 = 6.0;
const MARGIN_X: f32 = 60.0;
const MARGIN_TOP: f32 = 70.0;
const MARGIN_BOTTOM: f32 = 90.0;

/// Title anchor (fractions of the figure, measured from bottom-left) and
/// size, all fixed: 40 pt at the figure's ~100 dpi.
const LABEL_X: f32 = 0.55;
const LABEL_Y: f32 = 0.10;
const LABEL_SIZE: f32 = 55.0;

/// Stroke widths arrive in points; the figure rasterizes at ~100 dpi.
const PX_PER_PT: f32 = 100.0 / 72.0;

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// The bundled face for title annotations. Parsed per call; callers that
/// must fail fast (server startup) invoke this once up front.
pub fn title_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(FONT_BYTES).map_err(|_| Error::BadFont)
}

/// Draw the preprocessed grid as a ridge plot. Row 0 is the back line;
/// NaN cells break a line into gaps. Returns the raw RGBA figure.
pub fn plot(values: &Grid, params: &Params) -> Result<Vec<u8>> {
    let font = title_font()?;
    let mut img = RgbaImage::from_pixel(FIG_WIDTH, FIG_HEIGHT, BACKGROUND);

    let rows = values.h;
    let cols = values.w;
    if rows > 0 && cols > 1 {
        let vmax = values.finite_max().unwrap_or(0.0).max(0.0);
        let color_min = values.finite_min().unwrap_or(0.0);
        let color_range = (values.finite_max().unwrap_or(0.0) - color_min).max(1e-6);

        // Profile space: x is the sample index, y grows downward by
        // LINE_SPACING per line and shrinks by the cell's value.
        let wy_min = -vmax;
        let wy_span = ((rows - 1) as f32 * LINE_SPACING - wy_min).max(1e-6);
        let scale_y = (FIG_HEIGHT as f32 - MARGIN_TOP - MARGIN_BOTTOM) / wy_span;
        let step_x = (FIG_WIDTH as f32 - 2.0 * MARGIN_X) / (cols - 1) as f32;

        let lines: Vec<Vec<Option<(f32, f32)>>> = (0..rows)
            .into_par_iter()
            .map(|i| {
                values
                    .row(i)
                    .iter()
                    .map(|&v| {
                        if v.is_finite() {
                            let y = MARGIN_TOP + (i as f32 * LINE_SPACING - v - wy_min) * scale_y;
                            Some((y, (v - color_min) / color_range))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .collect();

        let half = (params.linewidth * PX_PER_PT * 0.5).max(0.05);
        for pts in &lines {
            // Occlude everything behind this line first, then stroke it.
            for j in 0..cols - 1 {
                if let (Some((y0, _)), Some((y1, _))) = (pts[j], pts[j + 1]) {
                    let x0 = MARGIN_X + j as f32 * step_x;
                    fill_below(&mut img, x0, y0, x0 + step_x, y1);
                }
            }
            for j in 0..cols - 1 {
                if let (Some((y0, t0)), Some((y1, t1))) = (pts[j], pts[j + 1]) {
                    let x0 = MARGIN_X + j as f32 * step_x;
                    let rgb = params.colormap.sample((t0 + t1) * 0.5);
                    stroke_segment(&mut img, (x0, y0), (x0 + step_x, y1), half, rgb);
                }
            }
        }
    }

    if !params.title.is_empty() {
        let scale = PxScale::from(LABEL_SIZE);
        let (_, th) = text_size(scale, &font, &params.title);
        let x = (LABEL_X * FIG_WIDTH as f32) as i32;
        let y = ((1.0 - LABEL_Y) * FIG_HEIGHT as f32) as i32 - th as i32;
        draw_text_mut(&mut img, LABEL_COLOR, x, y, scale, &font, &params.title);
    }

    Ok(img.into_raw())
}

/// Paint the background color from the segment down to the bottom edge,
/// hiding the lines drawn before it.
fn fill_below(img: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32) {
    let h = img.height() as i32;
    let w = img.width() as i32;
    let span = (x1 - x0).max(1e-6);
    let ix0 = x0.ceil() as i32;
    let ix1 = x1.floor() as i32;
    for ix in ix0.max(0)..=ix1.min(w - 1) {
        let t = (ix as f32 - x0) / span;
        let y = y0 + (y1 - y0) * t;
        for iy in (y.ceil() as i32).max(0)..h {
            img.put_pixel(ix as u32, iy as u32, BACKGROUND);
        }
    }
}

/// Anti-aliased stroke: coverage falls off linearly over the last pixel of
/// the half-width, computed from the distance to the segment.
fn stroke_segment(img: &mut RgbaImage, a: (f32, f32), b: (f32, f32), half: f32, rgb: [u8; 3]) {
    let w = img.width() as i32;
    let h = img.height() as i32;
    let reach = half + 1.5;
    let ix0 = ((a.0.min(b.0) - reach).floor() as i32).max(0);
    let ix1 = ((a.0.max(b.0) + reach).ceil() as i32).min(w - 1);
    let iy0 = ((a.1.min(b.1) - reach).floor() as i32).max(0);
    let iy1 = ((a.1.max(b.1) + reach).ceil() as i32).min(h - 1);

    for iy in iy0..=iy1 {
        for ix in ix0..=ix1 {
            let d = dist_to_segment(ix as f32 + 0.5, iy as f32 + 0.5, a, b);
            let cov = (half + 0.5 - d).clamp(0.0, 1.0);
            if cov > 0.0 {
                let px = img.get_pixel_mut(ix as u32, iy as u32);
                for c in 0..3 {
                    px.0[c] =
                        (px.0[c] as f32 * (1.0 - cov) + rgb[c] as f32 * cov).round() as u8;
                }
            }
        }
    }
}

fn dist_to_segment(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len2 = vx * vx + vy * vy;
    let t = if len2 > 0.0 {
        (((px - a.0) * vx + (py - a.1) * vy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (px - (a.0 + t * vx), py - (a.1 + t * vy));
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn wavy(rows: usize, cols: usize, amp: f32) -> Grid {
        let data = (0..rows * cols)
            .map(|i| {
                let x = (i % cols) as f32;
                (x * 0.3).sin().abs() * amp
            })
            .collect();
        Grid::from_data(cols, rows, data)
    }

    #[test]
    fn figure_is_fixed_size() {
        let rgba = plot(&wavy(40, 120, 200.0), &Params::default()).unwrap();
        assert_eq!(rgba.len(), (FIG_WIDTH * FIG_HEIGHT * 4) as usize);
    }

    #[test]
    fn margins_stay_background() {
        let rgba = plot(&wavy(40, 120, 200.0), &Params::default()).unwrap();
        // Top-left corner sits outside every margin.
        assert_eq!(&rgba[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn lines_leave_ink_on_the_canvas() {
        let rgba = plot(&wavy(40, 120, 200.0), &Params::default()).unwrap();
        let inked = rgba.chunks(4).filter(|p| p[0] != 255 || p[1] != 255 || p[2] != 255).count();
        assert!(inked > 1000, "expected ridge lines to be drawn, got {inked} pixels");
    }

    #[test]
    fn all_nan_grid_renders_blank_figure() {
        let mut params = Params::default();
        params.title = String::new();
        let g = Grid::from_data(50, 10, vec![f32::NAN; 500]);
        let rgba = plot(&g, &params).unwrap();
        assert!(rgba.chunks(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn rendering_is_deterministic() {
        let g = wavy(30, 80, 150.0);
        let p = Params::default();
        assert_eq!(plot(&g, &p).unwrap(), plot(&g, &p).unwrap());
    }

    #[test]
    fn bundled_font_parses() {
        assert!(title_font().is_ok());
    }
}
