//! Half-plane clip (Sutherland–Hodgman, single clip edge).

use bevy::math::Vec2;

use super::ClipResult;
use crate::geometry::{cross_2d, polygon::dedup_vertices};

/// Vertices closer than this after clipping are merged.
const MERGE_EPSILON: f32 = 1e-5;

/// Clips `subject` against the directed line `p0 → p1`, keeping the
/// half-plane on its right. With `p0` left of `p1` that is the water below
/// the line.
///
/// A subject entirely on the kept side is returned whole; one entirely on
/// the other side yields [`ClipResult::none`].
pub fn clip_against_line(subject: &[Vec2], p0: Vec2, p1: Vec2) -> ClipResult {
  debug_assert!(subject.len() >= 3, "clip subject needs at least 3 vertices");
  if subject.len() < 3 {
    return ClipResult::none();
  }

  let direction = p1 - p0;
  let side = |p: Vec2| cross_2d(direction, p - p0);

  let sides: Vec<f32> = subject.iter().map(|&p| side(p)).collect();
  if sides.iter().all(|&s| s <= 0.0) {
    return ClipResult::whole(subject);
  }
  if sides.iter().all(|&s| s >= 0.0) {
    return ClipResult::none();
  }

  let n = subject.len();
  let mut output = Vec::with_capacity(n + 2);
  for i in 0..n {
    let prev = (i + n - 1) % n;
    let (a, b) = (subject[prev], subject[i]);
    let (sa, sb) = (sides[prev], sides[i]);
    let a_inside = sa <= 0.0;
    let b_inside = sb <= 0.0;

    if b_inside {
      if !a_inside {
        output.push(intersect(a, b, sa, sb));
      }
      output.push(b);
    } else if a_inside {
      output.push(intersect(a, b, sa, sb));
    }
  }

  dedup_vertices(&mut output, MERGE_EPSILON);
  ClipResult::from_pieces(vec![output])
}

/// Point where segment `a → b` crosses the clip line, given signed sides.
#[inline]
fn intersect(a: Vec2, b: Vec2, sa: f32, sb: f32) -> Vec2 {
  let t = sa / (sa - sb);
  a + (b - a) * t
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::polygon_area;

  fn rect(min: Vec2, max: Vec2) -> Vec<Vec2> {
    vec![min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
  }

  fn waterline(y: f32) -> (Vec2, Vec2) {
    (Vec2::new(-100.0, y), Vec2::new(100.0, y))
  }

  #[test]
  fn half_submerged_box() {
    let subject = rect(Vec2::new(-1.0, -0.5), Vec2::new(1.0, 0.5));
    let (p0, p1) = waterline(0.0);
    let result = clip_against_line(&subject, p0, p1);
    assert!(result.intersects);
    assert_eq!(result.pieces.len(), 1);
    assert!((result.area() - 1.0).abs() < 1e-5);
    let centroid = result.centroid().unwrap();
    assert!((centroid.y + 0.25).abs() < 1e-5);
  }

  #[test]
  fn fully_above_is_none() {
    let subject = rect(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 2.0));
    let (p0, p1) = waterline(0.0);
    let result = clip_against_line(&subject, p0, p1);
    assert!(!result.intersects);
    assert!(result.pieces.is_empty());
  }

  #[test]
  fn fully_below_returns_subject() {
    let subject = rect(Vec2::new(-1.0, -3.0), Vec2::new(1.0, -2.0));
    let (p0, p1) = waterline(0.0);
    let result = clip_against_line(&subject, p0, p1);
    assert!(result.intersects);
    assert!((result.area() - polygon_area(&subject)).abs() < 1e-6);
  }

  #[test]
  fn sloped_line_cuts_diagonally() {
    // Line through (0,0) and (1,1) keeps the lower-right triangle of the box.
    let subject = rect(Vec2::ZERO, Vec2::ONE);
    let result = clip_against_line(&subject, Vec2::ZERO, Vec2::ONE);
    assert!(result.intersects);
    assert!((result.area() - 0.5).abs() < 1e-5);
  }

  #[test]
  fn concave_subject_keeps_both_prongs() {
    // U shape opening upward, waterline through the prongs.
    let subject = vec![
      Vec2::new(0.0, 0.0),
      Vec2::new(3.0, 0.0),
      Vec2::new(3.0, 3.0),
      Vec2::new(2.0, 3.0),
      Vec2::new(2.0, 1.0),
      Vec2::new(1.0, 1.0),
      Vec2::new(1.0, 3.0),
      Vec2::new(0.0, 3.0),
    ];
    let result = clip_against_line(&subject, Vec2::new(-1.0, 2.0), Vec2::new(4.0, 2.0));
    assert!(result.intersects);
    // Base 3x1 plus two prongs of 1x1.
    assert!((result.area() - 5.0).abs() < 1e-4);
  }
}
