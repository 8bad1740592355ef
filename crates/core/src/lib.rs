//! # stacchip core
//!
//! Core types shared by the stacchip crates.
//!
//! This crate provides:
//! - `CRS`: EPSG-coded coordinate reference systems and local UTM estimation
//! - `utm`: pure-Rust WGS84 <-> UTM transverse Mercator projection
//! - `geometry`: bounding boxes, point buffering, area-of-interest building,
//!   coverage ratios and GeoJSON conversion

pub mod crs;
pub mod error;
pub mod geometry;

pub use crs::{estimate_utm_crs, UtmZone, CRS};
pub use error::{Error, Result};
pub use geometry::{build_aoi, coverage_ratio, AreaOfInterest, BBox};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{estimate_utm_crs, UtmZone, CRS};
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        build_aoi, build_aoi_with, coverage_ratio, AoiOptions, AreaOfInterest, BBox,
    };
}
