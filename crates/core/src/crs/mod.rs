//! Coordinate Reference System handling

mod utm;

pub use utm::UtmZone;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate Reference System identified by its EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(WGS84_EPSG)
    }

    /// UTM CRS for a zone (EPSG 326xx north, 327xx south)
    pub fn utm(zone: UtmZone) -> Self {
        Self::from_epsg(zone.epsg())
    }

    /// Get the EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether this is WGS84 geographic (degrees, lon/lat order)
    pub fn is_geographic(&self) -> bool {
        self.epsg == WGS84_EPSG
    }

    /// UTM zone if this CRS is one of the WGS84 UTM zones
    pub fn utm_zone(&self) -> Option<UtmZone> {
        UtmZone::from_epsg(self.epsg)
    }

    /// Get a string identifier for this CRS, e.g. `EPSG:32613`
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Estimate the UTM CRS best suited to a WGS84 point.
///
/// The zone is the 6° longitude band containing the point and the hemisphere
/// follows the sign of the latitude. UTM is only defined between 80°S and
/// 84°N; points outside that band have no suitable local projection.
pub fn estimate_utm_crs(lon: f64, lat: f64) -> Result<CRS> {
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::invalid("lon", lon, "must be within [-180, 180]"));
    }
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::invalid("lat", lat, "must be within [-90, 90]"));
    }
    if !(utm::MIN_LAT..=utm::MAX_LAT).contains(&lat) {
        return Err(Error::NoLocalProjection { lat, lon });
    }
    Ok(CRS::utm(UtmZone::for_point(lon, lat)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), 4326);
        assert_eq!(crs.identifier(), "EPSG:4326");
        assert!(crs.is_geographic());
        assert_eq!(CRS::default(), CRS::wgs84());
    }

    #[test]
    fn test_utm_crs_roundtrip() {
        let crs = CRS::from_epsg(32613);
        let zone = crs.utm_zone().unwrap();
        assert_eq!(zone.number(), 13);
        assert!(zone.is_north());
        assert_eq!(CRS::utm(zone), crs);
        assert!(CRS::wgs84().utm_zone().is_none());
    }

    #[test]
    fn estimate_boulder() {
        let crs = estimate_utm_crs(-105.0, 40.0).unwrap();
        assert_eq!(crs.epsg(), 32613);
    }

    #[test]
    fn estimate_southern_hemisphere() {
        let crs = estimate_utm_crs(-58.3816, -34.6037).unwrap();
        assert_eq!(crs.epsg(), 32721);
    }

    #[test]
    fn estimate_antimeridian_edges() {
        assert_eq!(estimate_utm_crs(-180.0, 10.0).unwrap().epsg(), 32601);
        assert_eq!(estimate_utm_crs(180.0, 10.0).unwrap().epsg(), 32660);
    }

    #[test]
    fn estimate_rejects_polar_points() {
        assert!(matches!(
            estimate_utm_crs(0.0, 85.0),
            Err(Error::NoLocalProjection { .. })
        ));
        assert!(matches!(
            estimate_utm_crs(0.0, -81.0),
            Err(Error::NoLocalProjection { .. })
        ));
    }

    #[test]
    fn estimate_rejects_out_of_range() {
        assert!(matches!(
            estimate_utm_crs(181.0, 0.0),
            Err(Error::InvalidParameter { name: "lon", .. })
        ));
        assert!(matches!(
            estimate_utm_crs(0.0, f64::NAN),
            Err(Error::InvalidParameter { name: "lat", .. })
        ));
    }
}
