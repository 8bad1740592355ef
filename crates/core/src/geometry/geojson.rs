//! Minimal GeoJSON <-> `geo-types` conversion.
//!
//! STAC items carry their footprint as a raw GeoJSON geometry object. Only
//! the areal types (`Polygon`, `MultiPolygon`) and `Point` are needed here.

use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// GeoJSON Polygon object for a polygon.
pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": polygon_coordinates(polygon),
    })
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

/// Parse a GeoJSON geometry object into a `geo-types` geometry.
pub fn geometry_from_geojson(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidGeometry("missing geometry 'type'".into()))?;
    let coords = value
        .get("coordinates")
        .ok_or_else(|| Error::InvalidGeometry(format!("{kind} without 'coordinates'")))?;

    match kind {
        "Point" => {
            let c = parse_position(coords)?;
            Ok(Geometry::Point(Point(c)))
        }
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => {
            let polygons = as_array(coords)?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(Error::InvalidGeometry(format!(
            "unsupported geometry type '{other}'"
        ))),
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidGeometry(format!("expected array, got {value}")))
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pos = as_array(value)?;
    let number = |i: usize| {
        pos.get(i)
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::InvalidGeometry(format!("invalid position {value}")))
    };
    Ok(Coord {
        x: number(0)?,
        y: number(1)?,
    })
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let coords = as_array(value)?
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>>>()?;
    if coords.len() < 4 {
        return Err(Error::InvalidGeometry(format!(
            "linear ring needs at least 4 positions, got {}",
            coords.len()
        )));
    }
    Ok(LineString::new(coords))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = as_array(value)?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| Error::InvalidGeometry("polygon without rings".into()))?;
    Ok(Polygon::new(exterior, rings.collect()))
}
