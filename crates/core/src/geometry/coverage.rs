//! Coverage of a reference area by a candidate footprint.

use geo::{Area, BooleanOps};
use geo_types::{Geometry, MultiPolygon};

/// Unsigned planar area of a geometry in CRS units squared.
///
/// Non-areal geometries (points, lines) have zero area.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        Geometry::GeometryCollection(gc) => gc.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Fraction of `reference`'s area covered by `candidate`, in `[0, 1]`.
///
/// A zero-area reference is vacuously covered and yields `1.0`.
pub fn coverage_ratio(candidate: &Geometry<f64>, reference: &Geometry<f64>) -> f64 {
    let reference_area = area(reference);
    if reference_area == 0.0 {
        return 1.0;
    }

    let (Some(candidate), Some(reference)) = (areal(candidate), areal(reference)) else {
        return 0.0;
    };

    let covered = candidate.intersection(&reference).unsigned_area();
    (covered / reference_area).clamp(0.0, 1.0)
}

/// The areal part of a geometry as a multipolygon.
fn areal(geom: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .iter()
                .filter_map(areal)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}
