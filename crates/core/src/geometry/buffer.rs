//! Point buffering
//!
//! Circular buffers around points, approximated as regular polygons. The
//! input must be in a projected CRS whose units match `distance`.

use geo_types::{LineString, Point, Polygon};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer radius in CRS units
    pub distance: f64,
    /// Number of segments approximating the full circle (default: 64)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 64,
        }
    }
}

/// Create a circular buffer around a point.
///
/// The ring starts due east of the centre, runs counter-clockwise and is
/// closed (first vertex repeated).
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let n = params.segments.max(4);
    let r = params.distance.abs();
    let cx = point.x();
    let cy = point.y();

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((cx + r * angle.cos(), cy + r * angle.sin()));
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_buffer_point_circle() {
        let point = Point::new(0.0, 0.0);
        let params = BufferParams {
            distance: 10.0,
            segments: 64,
        };

        let polygon = buffer_point(&point, &params);

        // Area should approximate π * r²
        let expected_area = PI * 100.0;
        let actual_area = polygon.unsigned_area();

        let error = (actual_area - expected_area).abs() / expected_area;
        assert!(
            error < 0.01,
            "Circle area error {:.2}% (expected {:.1}, got {:.1})",
            error * 100.0,
            expected_area,
            actual_area
        );
    }

    #[test]
    fn test_buffer_point_vertex_count() {
        let point = Point::new(5.0, 5.0);
        let params = BufferParams {
            distance: 1.0,
            segments: 32,
        };

        let polygon = buffer_point(&point, &params);
        let ring = polygon.exterior();

        // Should have segments + 1 coordinates (closed ring)
        assert_eq!(ring.0.len(), 33);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn test_buffer_minimum_segments() {
        let polygon = buffer_point(
            &Point::new(0.0, 0.0),
            &BufferParams {
                distance: 1.0,
                segments: 1,
            },
        );
        assert_eq!(polygon.exterior().0.len(), 5);
    }
}
