use std::path::PathBuf;

use ridgeline::bbox::{BoundingBox, DEFAULT_BBOX};
use ridgeline::colormap::{Colormap, DEFAULT_COLORMAP};
use ridgeline::config::Params;
use ridgeline::elevation::TerrainTiles;
use ridgeline::render_ridge_map;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // The default scheme and the bundled font must exist before any work.
    Colormap::from_name(DEFAULT_COLORMAP).expect("default color scheme missing from registry");
    ridgeline::render::title_font().expect("bundled title font failed to parse");

    let corners: Vec<f64> = args
        .iter()
        .skip(1)
        .take(4)
        .filter_map(|s| s.parse().ok())
        .collect();
    let bbox = if corners.len() == 4 {
        BoundingBox {
            west: corners[0],
            south: corners[1],
            east: corners[2],
            north: corners[3],
        }
    } else {
        DEFAULT_BBOX
    };
    let out: PathBuf = args
        .get(5)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ridge.png"));

    let params = Params::default();

    eprintln!(
        "Rendering ({}, {}, {}, {}) with {} lines",
        bbox.west, bbox.south, bbox.east, bbox.north, params.num_lines
    );

    let source = TerrainTiles::new().expect("failed to build HTTP client");
    let (figure, timings) = match render_ridge_map(&source, &bbox, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("render failed: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("\nTimings:");
    for t in &timings {
        eprintln!("  {:12} {:8.1} ms", t.name, t.ms);
    }

    image::save_buffer(&out, &figure.rgba, figure.w, figure.h, image::ColorType::Rgba8)
        .expect("failed to save image");
    eprintln!("Saved {}", out.display());
}
