//! Exact clip against the waterline band.
//!
//! The band is the region under the sampled waterline down to the water
//! floor. Both polygons are snapped to a fixed-point integer grid before the
//! intersection so that nearly-coincident edges resolve the same way every
//! tick; the snapped integers are exactly representable in `f64`, which is
//! what the boolean-ops backend consumes.

use bevy::math::Vec2;
use geo::{BooleanOps, Coord, LineString, Polygon};

use super::ClipResult;
use crate::geometry::{bounds, ensure_ccw, polygon::dedup_vertices};

/// Default fixed-point scale (world units → integer grid).
pub const DEFAULT_CLIP_PRECISION: f64 = 100_000.0;

/// Clips `subject` against the polygon formed by `band` (waterline points,
/// left to right) closed with two corners at `floor_y`.
///
/// May return several disjoint pieces when the waterline dips through a
/// concave subject. Each piece is counter-clockwise and in world units.
pub fn clip_against_band(
  subject: &[Vec2],
  band: &[Vec2],
  floor_y: f32,
  precision: f64,
) -> ClipResult {
  debug_assert!(subject.len() >= 3, "clip subject needs at least 3 vertices");
  if subject.len() < 3 || band.len() < 2 {
    return ClipResult::none();
  }

  let subject_bounds = bounds(subject);
  let band_bounds = bounds(band);
  let left = band_bounds.min.x;
  let right = band_bounds.max.x;

  // Entirely above the highest crest, beside the band, or under the floor.
  if subject_bounds.min.y >= band_bounds.max.y
    || subject_bounds.max.x <= left
    || subject_bounds.min.x >= right
    || subject_bounds.max.y <= floor_y
  {
    return ClipResult::none();
  }

  // Entirely inside: below the lowest trough, above the floor, within span.
  if subject_bounds.max.y <= band_bounds.min.y
    && subject_bounds.min.y >= floor_y
    && subject_bounds.min.x >= left
    && subject_bounds.max.x <= right
  {
    return ClipResult::whole(subject);
  }

  let clip = band_polygon(band, floor_y);
  let subject_poly = to_fixed_polygon(subject, precision);
  let clip_poly = to_fixed_polygon(&clip, precision);

  let intersection = subject_poly.intersection(&clip_poly);

  let pieces: Vec<Vec<Vec2>> = intersection
    .iter()
    .map(|polygon| {
      // Holes only arise from interlocking concave shapes; the exterior ring
      // carries the submerged outline.
      let mut points = from_fixed_ring(polygon.exterior(), precision);
      dedup_vertices(&mut points, (1.0 / precision) as f32);
      ensure_ccw(&mut points);
      points
    })
    .collect();

  ClipResult::from_pieces(pieces)
}

/// Closes the waterline into a counter-clockwise polygon via the floor.
fn band_polygon(band: &[Vec2], floor_y: f32) -> Vec<Vec2> {
  let first = band[0];
  let last = band[band.len() - 1];
  let mut polygon = Vec::with_capacity(band.len() + 2);
  polygon.push(Vec2::new(first.x, floor_y));
  polygon.push(Vec2::new(last.x, floor_y));
  polygon.extend(band.iter().rev().copied());
  ensure_ccw(&mut polygon);
  polygon
}

/// Snaps a world coordinate onto the integer grid.
#[inline]
fn to_fixed(v: f32, precision: f64) -> f64 {
  (v as f64 * precision).round()
}

fn to_fixed_polygon(points: &[Vec2], precision: f64) -> Polygon<f64> {
  let ring: LineString<f64> = points
    .iter()
    .map(|p| Coord {
      x: to_fixed(p.x, precision),
      y: to_fixed(p.y, precision),
    })
    .collect();
  Polygon::new(ring, vec![])
}

/// Converts a closed ring back to world space, dropping the closing vertex.
fn from_fixed_ring(ring: &LineString<f64>, precision: f64) -> Vec<Vec2> {
  let mut points: Vec<Vec2> = ring
    .coords()
    .map(|c| Vec2::new((c.x / precision) as f32, (c.y / precision) as f32))
    .collect();
  if points.len() > 1 && points.first() == points.last() {
    points.pop();
  }
  points
}
