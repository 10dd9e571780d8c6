use thiserror::Error;

/// Everything that can go wrong between a render request and a finished
/// figure. Failures are terminal for the attempt; there is no retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "degenerate bounding box ({west}, {south}, {east}, {north}): requires west < east and south < north"
    )]
    DegenerateBbox {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },

    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    ParamRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown color scheme {0:?}")]
    UnknownColormap(String),

    #[error("elevation tile {z}/{x}/{y} returned HTTP {status}")]
    TileStatus { z: u8, x: u32, y: u32, status: u16 },

    #[error("elevation tile fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("elevation tile decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("bundled title font is not a valid TrueType face")]
    BadFont,
}

pub type Result<T> = std::result::Result<T, Error>;
