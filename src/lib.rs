pub mod bbox;
pub mod colormap;
pub mod config;
pub mod elevation;
pub mod error;
pub mod grid;
pub mod preprocess;
pub mod render;

use std::time::Instant;

use bbox::BoundingBox;
use config::Params;
use elevation::ElevationSource;

pub use bbox::DEFAULT_BBOX;
pub use error::{Error, Result};

/// A finished ridge map: raw RGBA pixels at the fixed figure size.
#[derive(Debug)]
pub struct Figure {
    pub w: u32,
    pub h: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Fetch elevation for the box, preprocess it per the parameters, and plot
/// the ridge map. Pure in its two inputs: nothing is cached or retained, so
/// calling twice with the same arguments repeats the whole pipeline.
pub fn render_ridge_map(
    source: &dyn ElevationSource,
    bbox: &BoundingBox,
    params: &Params,
) -> Result<(Figure, Vec<Timing>)> {
    bbox.validate()?;
    params.validate()?;

    let mut timings = Vec::new();

    let t = Instant::now();
    let grid = source.elevation_grid(bbox, params.num_lines)?;
    timings.push(Timing {
        name: "fetch",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let t = Instant::now();
    let values = preprocess::preprocess(
        grid,
        params.lake_flatness,
        params.water_ntile,
        params.vertical_ratio,
    );
    timings.push(Timing {
        name: "preprocess",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let t = Instant::now();
    let rgba = render::plot(&values, params)?;
    timings.push(Timing {
        name: "plot",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    Ok((
        Figure {
            w: render::FIG_WIDTH,
            h: render::FIG_HEIGHT,
            rgba,
        },
        timings,
    ))
}
