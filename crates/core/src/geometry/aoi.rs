//! Area-of-interest construction from a point and a radius.
//!
//! The point is projected into its local UTM zone, buffered there in metres
//! and the resulting circle is projected back to WGS84. Buffering in a
//! metric CRS keeps the circle round on the ground regardless of latitude.

use geo_types::{Geometry, LineString, Point, Polygon};
use tracing::{debug, warn};

use crate::crs::{estimate_utm_crs, CRS};
use crate::error::{Error, Result};
use crate::geometry::buffer::{buffer_point, BufferParams};
use crate::geometry::{geojson, BBox};

/// Options for [`build_aoi_with`].
#[derive(Debug, Clone)]
pub struct AoiOptions {
    /// Number of segments of the circle approximation (default: 64)
    pub segments: usize,
}

impl Default for AoiOptions {
    fn default() -> Self {
        Self { segments: 64 }
    }
}

/// A circular area of interest in WGS84 coordinates.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    center: Point<f64>,
    radius_m: f64,
    local_crs: CRS,
    polygon: Polygon<f64>,
    bbox: BBox,
}

impl AreaOfInterest {
    /// Centre point `(lon, lat)`.
    pub fn center(&self) -> Point<f64> {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// The projected CRS the buffer was computed in.
    pub fn local_crs(&self) -> CRS {
        self.local_crs
    }

    /// Polygon in WGS84 `(lon, lat)`.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// The polygon as a generic geometry, for coverage computations.
    pub fn geometry(&self) -> Geometry<f64> {
        Geometry::Polygon(self.polygon.clone())
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// True when the ring reaches past ±180° longitude. Such rings are kept
    /// as built, unsplit.
    pub fn crosses_antimeridian(&self) -> bool {
        self.bbox.min_x < -180.0 || self.bbox.max_x > 180.0
    }

    /// GeoJSON Polygon object, suitable for a STAC `intersects` filter.
    pub fn to_geojson(&self) -> serde_json::Value {
        geojson::polygon_to_geojson(&self.polygon)
    }
}

/// Build a circular AOI of `radius_m` metres around `(lat, lon)`.
pub fn build_aoi(lat: f64, lon: f64, radius_m: f64) -> Result<AreaOfInterest> {
    build_aoi_with(lat, lon, radius_m, &AoiOptions::default())
}

/// Build a circular AOI with explicit options.
pub fn build_aoi_with(
    lat: f64,
    lon: f64,
    radius_m: f64,
    options: &AoiOptions,
) -> Result<AreaOfInterest> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(Error::invalid("radius", radius_m, "must be a positive number of metres"));
    }

    let local_crs = estimate_utm_crs(lon, lat)?;
    let zone = local_crs
        .utm_zone()
        .ok_or(Error::NoLocalProjection { lat, lon })?;

    let (easting, northing) = zone.forward(lon, lat);
    let circle = buffer_point(
        &Point::new(easting, northing),
        &BufferParams {
            distance: radius_m,
            segments: options.segments,
        },
    );

    let ring: Vec<(f64, f64)> = circle
        .exterior()
        .coords()
        .map(|c| zone.inverse(c.x, c.y))
        .collect();
    let polygon = Polygon::new(LineString::from(ring), vec![]);

    let bbox = BBox::of(&Geometry::Polygon(polygon.clone())).ok_or_else(|| {
        Error::InvalidGeometry("buffered area of interest is empty".to_string())
    })?;

    debug!(
        lat,
        lon,
        radius_m,
        crs = %local_crs,
        bbox = ?bbox.to_array(),
        "built area of interest"
    );

    let aoi = AreaOfInterest {
        center: Point::new(lon, lat),
        radius_m,
        local_crs,
        polygon,
        bbox,
    };
    if aoi.crosses_antimeridian() {
        warn!(
            lat,
            lon,
            radius_m,
            bbox = ?bbox.to_array(),
            "area of interest crosses the antimeridian; longitudes leave [-180, 180]"
        );
    }
    Ok(aoi)
}
