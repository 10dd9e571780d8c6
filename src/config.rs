use std::ops::RangeInclusive;

use crate::colormap::Colormap;
use crate::error::{Error, Result};

/// All tunable plot parameters — exposed as UI controls in the frontend.
/// The shipped controls carry these same ranges, so an out-of-range value
/// can only arrive from a hand-built request; `validate` rejects it there.
#[derive(Clone, Debug)]
pub struct Params {
    pub title: String,
    pub num_lines: u32,
    pub linewidth: f32,
    pub vertical_ratio: u32,
    pub lake_flatness: f32,
    pub water_ntile: u32,
    pub colormap: Colormap,
}

pub const NUM_LINES: RangeInclusive<u32> = 25..=500;
pub const LINEWIDTH: RangeInclusive<f32> = 0.1..=5.0;
pub const VERTICAL_RATIO: RangeInclusive<u32> = 0..=1000;
pub const LAKE_FLATNESS: RangeInclusive<f32> = 0.0..=10.0;
pub const WATER_NTILE: RangeInclusive<u32> = 0..=100;

impl Default for Params {
    fn default() -> Self {
        Self {
            title: "Mt. Shasta".to_string(),
            num_lines: 150,
            linewidth: 1.0,
            vertical_ratio: 200,
            lake_flatness: 0.0,
            water_ntile: 0,
            colormap: Colormap::default(),
        }
    }
}

impl Params {
    /// Reports the first field outside its declared range.
    pub fn validate(&self) -> Result<()> {
        check("num_lines", self.num_lines as f64, &NUM_LINES)?;
        check_f("linewidth", self.linewidth, &LINEWIDTH)?;
        check("vertical_ratio", self.vertical_ratio as f64, &VERTICAL_RATIO)?;
        check_f("lake_flatness", self.lake_flatness, &LAKE_FLATNESS)?;
        check("water_ntile", self.water_ntile as f64, &WATER_NTILE)?;
        Ok(())
    }
}

fn check(field: &'static str, value: f64, range: &RangeInclusive<u32>) -> Result<()> {
    let (min, max) = (*range.start() as f64, *range.end() as f64);
    if value < min || value > max {
        return Err(Error::ParamRange { field, value, min, max });
    }
    Ok(())
}

fn check_f(field: &'static str, value: f32, range: &RangeInclusive<f32>) -> Result<()> {
    if !range.contains(&value) || value.is_nan() {
        return Err(Error::ParamRange {
            field,
            value: value as f64,
            min: *range.start() as f64,
            max: *range.end() as f64,
        });
    }
    Ok(())
}
