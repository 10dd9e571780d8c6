//! Elevation acquisition from the public AWS terrain tileset.
//!
//! Tiles are Terrarium-encoded PNGs: elevation in meters is packed into RGB
//! as `(r * 256 + g + b / 256) - 32768`. The tileset is global, requires no
//! API key, and serves standard slippy-map `{z}/{x}/{y}` addresses.

use rayon::prelude::*;
use tracing::debug;

use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::grid::Grid;

/// Samples per ridge line, west to east. The line count controls rows; the
/// horizontal resolution is fixed.
pub const SAMPLES_PER_LINE: usize = 300;

const TILE_SIZE: u32 = 256;
const TILE_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";
const MIN_ZOOM: u8 = 1;
const MAX_ZOOM: u8 = 14;

/// Anything that can produce an elevation grid for a geographic box.
///
/// Rows run south to north, columns west to east, one row per ridge line.
pub trait ElevationSource: Send + Sync {
    fn elevation_grid(&self, bbox: &BoundingBox, num_lines: u32) -> Result<Grid>;
}

/// Production source: fetch, decode, and mosaic the terrain tiles covering
/// a box, then bilinearly sample the requested grid out of the mosaic.
pub struct TerrainTiles {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TerrainTiles {
    pub fn new() -> Result<Self> {
        Self::with_base_url(TILE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ridgeline/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn fetch_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<f32>> {
        let url = format!("{}/{z}/{x}/{y}.png", self.base_url);
        let resp = self.client.get(&url).send()?;
        if !resp.status().is_success() {
            return Err(Error::TileStatus {
                z,
                x,
                y,
                status: resp.status().as_u16(),
            });
        }
        let bytes = resp.bytes()?;
        let rgb = image::load_from_memory(&bytes)?.to_rgb8();
        Ok(rgb
            .pixels()
            .map(|p| decode_terrarium(p.0[0], p.0[1], p.0[2]))
            .collect())
    }

    fn fetch_mosaic(&self, bbox: &BoundingBox, z: u8) -> Result<Mosaic> {
        let max_tile = (1u32 << z) - 1;
        let x0 = (lon_to_tile_x(bbox.west, z).floor() as i64).clamp(0, max_tile as i64) as u32;
        let x1 = (lon_to_tile_x(bbox.east, z).floor() as i64).clamp(0, max_tile as i64) as u32;
        let y0 = (lat_to_tile_y(bbox.north, z).floor() as i64).clamp(0, max_tile as i64) as u32;
        let y1 = (lat_to_tile_y(bbox.south, z).floor() as i64).clamp(0, max_tile as i64) as u32;

        let coords: Vec<(u32, u32)> = (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
            .collect();
        debug!(zoom = z, tiles = coords.len(), "fetching elevation tiles");

        let tiles: Vec<(u32, u32, Vec<f32>)> = coords
            .par_iter()
            .map(|&(x, y)| self.fetch_tile(z, x, y).map(|px| (x, y, px)))
            .collect::<Result<_>>()?;

        let tiles_x = (x1 - x0 + 1) as usize;
        let tiles_y = (y1 - y0 + 1) as usize;
        let w_px = tiles_x * TILE_SIZE as usize;
        let h_px = tiles_y * TILE_SIZE as usize;
        let mut px = vec![0.0f32; w_px * h_px];
        for (x, y, tile) in tiles {
            let ox = (x - x0) as usize * TILE_SIZE as usize;
            let oy = (y - y0) as usize * TILE_SIZE as usize;
            for row in 0..TILE_SIZE as usize {
                let src = &tile[row * TILE_SIZE as usize..(row + 1) * TILE_SIZE as usize];
                let dst = (oy + row) * w_px + ox;
                px[dst..dst + TILE_SIZE as usize].copy_from_slice(src);
            }
        }

        Ok(Mosaic { z, x0, y0, w_px, h_px, px })
    }
}

impl ElevationSource for TerrainTiles {
    fn elevation_grid(&self, bbox: &BoundingBox, num_lines: u32) -> Result<Grid> {
        bbox.validate()?;
        let z = zoom_for(bbox, SAMPLES_PER_LINE);
        let mosaic = self.fetch_mosaic(bbox, z)?;
        Ok(mosaic.sample_grid(bbox, num_lines.max(1) as usize, SAMPLES_PER_LINE))
    }
}

/// Decoded elevation pixels for a rectangle of tiles at one zoom level.
struct Mosaic {
    z: u8,
    x0: u32,
    y0: u32,
    w_px: usize,
    h_px: usize,
    px: Vec<f32>,
}

impl Mosaic {
    /// Sample `rows` x `cols` elevations uniform in lat/lon, row 0 at the
    /// southern edge of the box.
    fn sample_grid(&self, bbox: &BoundingBox, rows: usize, cols: usize) -> Grid {
        let data: Vec<f32> = (0..rows)
            .into_par_iter()
            .flat_map_iter(|i| {
                let lat = if rows > 1 {
                    bbox.south + bbox.height() * i as f64 / (rows - 1) as f64
                } else {
                    bbox.south
                };
                (0..cols).map(move |j| {
                    let lon = if cols > 1 {
                        bbox.west + bbox.width() * j as f64 / (cols - 1) as f64
                    } else {
                        bbox.west
                    };
                    self.sample(lon, lat)
                })
            })
            .collect();
        Grid::from_data(cols, rows, data)
    }

    fn sample(&self, lon: f64, lat: f64) -> f32 {
        let gx = (lon_to_tile_x(lon, self.z) - self.x0 as f64) * TILE_SIZE as f64 - 0.5;
        let gy = (lat_to_tile_y(lat, self.z) - self.y0 as f64) * TILE_SIZE as f64 - 0.5;
        self.bilinear(gx, gy)
    }

    fn bilinear(&self, gx: f64, gy: f64) -> f32 {
        let x0 = gx.floor();
        let y0 = gy.floor();
        let fx = (gx - x0) as f32;
        let fy = (gy - y0) as f32;
        let at = |x: i64, y: i64| -> f32 {
            let x = x.clamp(0, self.w_px as i64 - 1) as usize;
            let y = y.clamp(0, self.h_px as i64 - 1) as usize;
            self.px[y * self.w_px + x]
        };
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = at(x0, y0) * (1.0 - fx) + at(x0 + 1, y0) * fx;
        let bot = at(x0, y0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bot * fy
    }
}

#[inline]
fn decode_terrarium(r: u8, g: u8, b: u8) -> f32 {
    r as f32 * 256.0 + g as f32 + b as f32 / 256.0 - 32768.0
}

fn lon_to_tile_x(lon: f64, z: u8) -> f64 {
    (lon + 180.0) / 360.0 * (1u32 << z) as f64
}

fn lat_to_tile_y(lat: f64, z: u8) -> f64 {
    // Web Mercator is undefined at the poles; clamp to its limits.
    let lat = lat.clamp(-85.0511, 85.0511).to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * (1u32 << z) as f64
}

/// Smallest zoom whose tile pixels are at least as fine as the requested
/// horizontal sampling of the box.
fn zoom_for(bbox: &BoundingBox, samples: usize) -> u8 {
    let span = bbox.width().max(1e-6);
    let need = 360.0 * samples as f64 / (TILE_SIZE as f64 * span);
    (need.log2().ceil() as i32).clamp(MIN_ZOOM as i32, MAX_ZOOM as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::DEFAULT_BBOX;

    #[test]
    fn tile_math_matches_slippy_conventions() {
        assert_eq!(lon_to_tile_x(-180.0, 0), 0.0);
        assert_eq!(lon_to_tile_x(0.0, 1), 1.0);
        assert_eq!(lon_to_tile_x(180.0, 1), 2.0);
        assert!((lat_to_tile_y(0.0, 1) - 1.0).abs() < 1e-9);
        // Northern latitudes map to smaller y.
        assert!(lat_to_tile_y(45.0, 4) < lat_to_tile_y(-45.0, 4));
    }

    #[test]
    fn terrarium_decoding() {
        assert_eq!(decode_terrarium(128, 0, 0), 0.0);
        assert_eq!(decode_terrarium(129, 0, 0), 256.0);
        assert_eq!(decode_terrarium(127, 255, 0), -1.0);
        assert_eq!(decode_terrarium(128, 0, 128), 0.5);
    }

    #[test]
    fn zoom_tracks_box_width() {
        assert_eq!(zoom_for(&DEFAULT_BBOX, SAMPLES_PER_LINE), 10);
        let wide = BoundingBox {
            west: -130.0,
            south: 20.0,
            east: -60.0,
            north: 55.0,
        };
        assert_eq!(zoom_for(&wide, SAMPLES_PER_LINE), 3);
        let sliver = BoundingBox {
            west: 0.0,
            south: 0.0,
            east: 1e-9,
            north: 1e-9,
        };
        assert_eq!(zoom_for(&sliver, SAMPLES_PER_LINE), MAX_ZOOM);
    }

    fn world_mosaic(px: Vec<f32>) -> Mosaic {
        Mosaic {
            z: 0,
            x0: 0,
            y0: 0,
            w_px: 256,
            h_px: 256,
            px,
        }
    }

    #[test]
    fn constant_mosaic_samples_constant_grid() {
        let mosaic = world_mosaic(vec![512.0; 256 * 256]);
        let bbox = BoundingBox {
            west: -45.0,
            south: -40.0,
            east: 45.0,
            north: 40.0,
        };
        let grid = mosaic.sample_grid(&bbox, 10, 20);
        assert_eq!((grid.w, grid.h), (20, 10));
        assert!(grid.data.iter().all(|&v| (v - 512.0).abs() < 1e-3));
    }

    #[test]
    fn grid_rows_run_south_to_north() {
        // Northern half of the world raster high, southern half low.
        let mut px = vec![0.0f32; 256 * 256];
        for y in 0..128 {
            for x in 0..256 {
                px[y * 256 + x] = 1000.0;
            }
        }
        let mosaic = world_mosaic(px);
        let bbox = BoundingBox {
            west: -90.0,
            south: -60.0,
            east: 90.0,
            north: 60.0,
        };
        let grid = mosaic.sample_grid(&bbox, 8, 8);
        assert!(grid.get(0, 0) < 10.0, "row 0 must be the southern edge");
        assert!(grid.get(0, 7) > 990.0, "last row must be the northern edge");
    }
}
