//! Polygon math shared by clipping and force computation.
//!
//! All routines expect counter-clockwise winding. [`ensure_ccw`] is applied
//! wherever polygons enter the crate (shape conversion, clip output), so the
//! area clamp in [`polygon_area_and_centroid`] only catches degenerate input.

use bevy::math::{Rect, Vec2};

/// Areas at or below this are treated as empty.
pub const AREA_EPSILON: f32 = 1e-6;

/// 2D cross product (z-component of 3D cross product).
#[inline]
pub fn cross_2d(a: Vec2, b: Vec2) -> f32 {
  a.x * b.y - a.y * b.x
}

/// Iterates the closed edge list of a polygon as `(start, end)` pairs.
pub fn edges(polygon: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
  let n = polygon.len();
  (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

/// Signed shoelace area. Positive for counter-clockwise winding.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
  edges(polygon).map(|(a, b)| cross_2d(a, b)).sum::<f32>() * 0.5
}

/// Returns true if the polygon winds counter-clockwise.
pub fn is_counter_clockwise(polygon: &[Vec2]) -> bool {
  signed_area(polygon) > 0.0
}

/// Reverses the vertex order of a clockwise polygon in place.
pub fn ensure_ccw(polygon: &mut [Vec2]) {
  if signed_area(polygon) < 0.0 {
    polygon.reverse();
  }
}

/// Polygon area via the shoelace formula.
///
/// A negative result (clockwise or self-overlapping input) is clamped to 0.
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
  if polygon.len() < 3 {
    return 0.0;
  }
  signed_area(polygon).max(0.0)
}

/// Polygon area and centroid.
///
/// The centroid uses the signed-area-weighted vertex-pair formula. When the
/// area is clamped to 0 the centroid falls back to the vertex average, which
/// keeps force application points finite for degenerate slivers.
pub fn polygon_area_and_centroid(polygon: &[Vec2]) -> (f32, Vec2) {
  if polygon.is_empty() {
    return (0.0, Vec2::ZERO);
  }

  let mut doubled_area = 0.0;
  let mut weighted = Vec2::ZERO;
  for (a, b) in edges(polygon) {
    let cross = cross_2d(a, b);
    doubled_area += cross;
    weighted += (a + b) * cross;
  }

  let area = doubled_area * 0.5;
  if area <= AREA_EPSILON {
    return (0.0, vertex_average(polygon));
  }

  (area, weighted / (3.0 * doubled_area))
}

/// Arithmetic mean of the vertices.
pub fn vertex_average(polygon: &[Vec2]) -> Vec2 {
  if polygon.is_empty() {
    return Vec2::ZERO;
  }
  polygon.iter().copied().sum::<Vec2>() / polygon.len() as f32
}

/// Axis-aligned bounds of a point set. Empty input yields an empty rect.
pub fn bounds(points: &[Vec2]) -> Rect {
  let Some(&first) = points.first() else {
    return Rect::default();
  };
  points
    .iter()
    .fold(Rect::from_corners(first, first), |rect, &p| {
      rect.union_point(p)
    })
}

/// Removes consecutive vertices closer than `epsilon`, including the
/// wrap-around pair.
pub fn dedup_vertices(polygon: &mut Vec<Vec2>, epsilon: f32) {
  let eps_sq = epsilon * epsilon;
  polygon.dedup_by(|b, a| a.distance_squared(*b) <= eps_sq);
  while polygon.len() > 1 {
    let first = polygon[0];
    let last = polygon[polygon.len() - 1];
    if first.distance_squared(last) > eps_sq {
      break;
    }
    polygon.pop();
  }
}
