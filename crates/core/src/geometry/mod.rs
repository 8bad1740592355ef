//! Geometry primitives for area-of-interest handling.
//!
//! Coordinates are `(x, y)` = `(longitude, latitude)` in degrees unless a
//! function says otherwise.

pub mod aoi;
pub mod buffer;
pub mod coverage;
pub mod geojson;

pub use aoi::{build_aoi, build_aoi_with, AoiOptions, AreaOfInterest};
pub use buffer::{buffer_point, BufferParams};
pub use coverage::{area, coverage_ratio};

use geo::BoundingRect;
use geo_types::{Geometry, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounding box of a geometry, `None` for empty geometries.
    pub fn of(geom: &Geometry<f64>) -> Option<Self> {
        geom.bounding_rect()
            .map(|rect| Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// `[min_x, min_y, max_x, max_y]`, the order used by STAC and gdalwarp `-te`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}
