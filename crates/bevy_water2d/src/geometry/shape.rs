//! Collider silhouettes as a closed sum type.
//!
//! Curved shapes are approximated by regular N-gons; the vertex count is a
//! caller-provided tunable so the same shape can be clipped cheaply or
//! accurately.

use std::f32::consts::{PI, TAU};

use bevy::math::{Affine2, Rect, Vec2};

use super::polygon::{bounds, ensure_ccw};

/// Minimum vertex count for curved shape approximations.
pub const MIN_CURVE_SEGMENTS: usize = 3;

/// Local-space silhouette of a floating object.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
  /// Axis-aligned box centered on the origin.
  Box { half_extents: Vec2 },
  /// Circle (or sphere seen side-on) centered on the origin.
  Circle { radius: f32 },
  /// Capsule aligned with the local Y axis; `half_length` excludes the caps.
  Capsule { half_length: f32, radius: f32 },
  /// Arbitrary simple polygon, stored counter-clockwise.
  Polygon { points: Vec<Vec2> },
}

impl Shape {
  pub fn rectangle(width: f32, height: f32) -> Self {
    Self::Box {
      half_extents: Vec2::new(width, height) * 0.5,
    }
  }

  pub fn circle(radius: f32) -> Self {
    Self::Circle { radius }
  }

  pub fn capsule(half_length: f32, radius: f32) -> Self {
    Self::Capsule {
      half_length,
      radius,
    }
  }

  /// Creates a polygon shape, reversing clockwise input.
  pub fn polygon(points: impl Into<Vec<Vec2>>) -> Self {
    let mut points = points.into();
    ensure_ccw(&mut points);
    Self::Polygon { points }
  }

  /// Bounding radius around the local origin.
  pub fn radius(&self) -> f32 {
    match self {
      Self::Box { half_extents } => half_extents.length(),
      Self::Circle { radius } => *radius,
      Self::Capsule {
        half_length,
        radius,
      } => half_length + radius,
      Self::Polygon { points } => points.iter().map(|p| p.length()).fold(0.0, f32::max),
    }
  }

  /// Local-space outline, counter-clockwise.
  pub fn local_polygon(&self, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(MIN_CURVE_SEGMENTS);
    match self {
      Self::Box { half_extents } => {
        let h = *half_extents;
        vec![
          Vec2::new(-h.x, -h.y),
          Vec2::new(h.x, -h.y),
          Vec2::new(h.x, h.y),
          Vec2::new(-h.x, h.y),
        ]
      }
      Self::Circle { radius } => (0..segments)
        .map(|i| Vec2::from_angle(TAU * i as f32 / segments as f32) * *radius)
        .collect(),
      Self::Capsule {
        half_length,
        radius,
      } => {
        // Each cap gets half the budget, endpoints included.
        let per_cap = (segments / 2).max(2);
        let top = Vec2::new(0.0, *half_length);
        let bottom = Vec2::new(0.0, -*half_length);
        let mut points = Vec::with_capacity(per_cap * 2);
        for i in 0..per_cap {
          let angle = PI * i as f32 / (per_cap - 1) as f32;
          points.push(top + Vec2::from_angle(angle) * *radius);
        }
        for i in 0..per_cap {
          let angle = PI + PI * i as f32 / (per_cap - 1) as f32;
          points.push(bottom + Vec2::from_angle(angle) * *radius);
        }
        points
      }
      Self::Polygon { points } => points.clone(),
    }
  }

  /// World-space outline under `transform`, counter-clockwise.
  ///
  /// Mirroring transforms flip the winding, so it is re-checked after the
  /// transform.
  pub fn to_world_polygon(&self, transform: &Affine2, segments: usize) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = self
      .local_polygon(segments)
      .into_iter()
      .map(|p| transform.transform_point2(p))
      .collect();
    ensure_ccw(&mut points);
    points
  }

  /// World-space bounds under `transform`.
  pub fn world_bounds(&self, transform: &Affine2, segments: usize) -> Rect {
    bounds(&self.to_world_polygon(transform, segments))
  }
}
