use serde::Deserialize;

use crate::error::{Error, Result};

/// Geographic box in WGS-84 degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Box used until the map widget has reported a viewport. A literal
/// constant, deliberately not derived from the map's default center.
pub const DEFAULT_BBOX: BoundingBox = BoundingBox {
    west: -122.5,
    south: 41.25,
    east: -122.0,
    north: 41.5,
};

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Viewport corners in the shape the Leaflet widget reports them.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<()> {
        let ordered = self.west < self.east && self.south < self.north;
        if ordered && self.west.is_finite() && self.south.is_finite() && self.east.is_finite() && self.north.is_finite() {
            Ok(())
        } else {
            Err(Error::DegenerateBbox {
                west: self.west,
                south: self.south,
                east: self.east,
                north: self.north,
            })
        }
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

impl From<LatLngBounds> for BoundingBox {
    fn from(b: LatLngBounds) -> Self {
        Self {
            west: b.south_west.lng,
            south: b.south_west.lat,
            east: b.north_east.lng,
            north: b.north_east.lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_box_is_the_literal_constant() {
        assert_eq!(DEFAULT_BBOX.west, -122.5);
        assert_eq!(DEFAULT_BBOX.south, 41.25);
        assert_eq!(DEFAULT_BBOX.east, -122.0);
        assert_eq!(DEFAULT_BBOX.north, 41.5);
        assert!(DEFAULT_BBOX.validate().is_ok());
    }

    #[test]
    fn leaflet_bounds_map_corner_for_corner() {
        let bounds: LatLngBounds = serde_json::from_str(
            r#"{"southWest":{"lng":-123.0,"lat":41.0},"northEast":{"lng":-122.0,"lat":42.0}}"#,
        )
        .unwrap();
        let bbox = BoundingBox::from(bounds);
        assert_eq!(
            bbox,
            BoundingBox {
                west: -123.0,
                south: 41.0,
                east: -122.0,
                north: 42.0
            }
        );
    }

    #[test]
    fn inverted_boxes_are_degenerate() {
        let flipped = BoundingBox {
            west: -122.0,
            south: 41.25,
            east: -122.5,
            north: 41.5,
        };
        assert!(flipped.validate().is_err());

        let flat = BoundingBox {
            west: -122.5,
            south: 41.5,
            east: -122.0,
            north: 41.5,
        };
        assert!(flat.validate().is_err());
    }
}
