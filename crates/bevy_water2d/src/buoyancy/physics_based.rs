//! Area-based buoyancy with per-edge drag and lift.

use bevy::math::Vec2;

use super::BuoyancyParams;
use crate::clip::SubmergedPolygon;
use crate::geometry::{AREA_EPSILON, cross_2d, edges};

/// A force and the world point it acts on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointForce {
  pub force: Vec2,
  pub point: Vec2,
}

/// Forces on one submerged edge, all acting at its midpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeForce {
  pub midpoint: Vec2,
  /// Outward unit normal.
  pub normal: Vec2,
  pub length: f32,
  /// Normal against the relative fluid direction; `<= 0` means leading.
  pub drag_dot: f32,
  pub drag: Vec2,
  pub lift: Vec2,
  pub flow: Vec2,
}

impl EdgeForce {
  #[inline]
  pub fn is_leading(&self) -> bool {
    self.drag_dot <= 0.0
  }

  #[inline]
  pub fn total(&self) -> Vec2 {
    self.drag + self.lift + self.flow
  }
}

/// Output of [`physics_based_forces`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsForces {
  /// Combined buoyancy at the area-weighted centroid of all pieces.
  pub buoyancy: PointForce,
  pub edges: Vec<EdgeForce>,
  pub submerged_area: f32,
}

impl PhysicsForces {
  pub fn total_force(&self) -> Vec2 {
    self.buoyancy.force + self.edges.iter().map(EdgeForce::total).sum::<Vec2>()
  }

  /// Torque of every force about `pivot` (counter-clockwise positive).
  pub fn torque_about(&self, pivot: Vec2) -> f32 {
    let buoyancy = cross_2d(self.buoyancy.point - pivot, self.buoyancy.force);
    buoyancy
      + self
        .edges
        .iter()
        .map(|e| cross_2d(e.midpoint - pivot, e.total()))
        .sum::<f32>()
  }

  /// Every non-zero force with its application point.
  pub fn point_forces(&self) -> impl Iterator<Item = PointForce> + '_ {
    std::iter::once(self.buoyancy)
      .chain(self.edges.iter().map(|e| PointForce {
        force: e.total(),
        point: e.midpoint,
      }))
      .filter(|p| p.force != Vec2::ZERO)
  }

  pub fn scale(&mut self, factor: f32) {
    self.buoyancy.force *= factor;
    for edge in &mut self.edges {
      edge.drag *= factor;
      edge.lift *= factor;
      edge.flow *= factor;
    }
  }
}

/// Computes buoyancy and hydrodynamic forces for the submerged `pieces`.
///
/// `fluid_velocity_at` returns the velocity of the water relative to the
/// object at a world point (for still water: minus the object's point
/// velocity). An edge leads when its outward normal opposes that velocity.
pub fn physics_based_forces(
  pieces: &[SubmergedPolygon],
  fluid_velocity_at: impl Fn(Vec2) -> Vec2,
  params: &BuoyancyParams,
) -> PhysicsForces {
  let area: f32 = pieces.iter().map(|p| p.area).sum();
  if area <= AREA_EPSILON {
    return PhysicsForces::default();
  }
  let centroid = pieces
    .iter()
    .map(|p| p.centroid * p.area)
    .sum::<Vec2>()
    / area;

  let density = params.density;
  let flow = params.flow.direction().map(|d| (d, params.flow.strength));
  let mut edge_forces = Vec::with_capacity(pieces.iter().map(|p| p.points.len()).sum());

  for piece in pieces {
    for (a, b) in edges(&piece.points) {
      let along = b - a;
      let length = along.length();
      if length <= f32::EPSILON {
        continue;
      }
      let tangent = along / length;
      // Right-hand perpendicular is outward for counter-clockwise rings.
      let normal = Vec2::new(tangent.y, -tangent.x);
      let midpoint = (a + b) * 0.5;

      let mut edge = EdgeForce {
        midpoint,
        normal,
        length,
        ..Default::default()
      };

      let velocity = fluid_velocity_at(midpoint);
      let speed_sq = velocity.length_squared();
      if let Some(direction) = velocity.try_normalize() {
        edge.drag_dot = normal.dot(direction);
        if edge.is_leading() {
          let base = edge.drag_dot * length * density * speed_sq;
          let drag = (-base * params.drag_coefficient).clamp(0.0, params.max_drag);
          edge.drag = direction * drag;

          let lift = (base * tangent.dot(direction) * params.lift_coefficient)
            .clamp(-params.max_lift, params.max_lift);
          edge.lift = direction.perp() * lift;
        }
      }

      if let Some((direction, strength)) = flow
        && normal.dot(direction) < 0.0
      {
        edge.flow = direction * strength * length;
      }

      edge_forces.push(edge);
    }
  }

  PhysicsForces {
    buoyancy: PointForce {
      force: -params.gravity() * area * density,
      point: centroid,
    },
    edges: edge_forces,
    submerged_area: area,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::buoyancy::FlowParams;
  use crate::clip::clip_against_line;

  fn box_2x1() -> Vec<Vec2> {
    vec![
      Vec2::new(-1.0, -0.5),
      Vec2::new(1.0, -0.5),
      Vec2::new(1.0, 0.5),
      Vec2::new(-1.0, 0.5),
    ]
  }

  fn half_submerged() -> Vec<SubmergedPolygon> {
    // Waterline at y = 0 leaves the lower half (2 x 0.5) under water.
    let result = clip_against_line(&box_2x1(), Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
    assert_eq!(result.pieces.len(), 1);
    result.pieces
  }

  #[test]
  fn equilibrium_box_buoyancy() {
    let pieces = half_submerged();
    assert!((pieces[0].area - 1.0).abs() < 1e-5);

    let params = BuoyancyParams::default();
    let forces = physics_based_forces(&pieces, |_| Vec2::ZERO, &params);
    assert!((forces.buoyancy.force.length() - 9.8).abs() < 1e-4);
    assert!(forces.buoyancy.force.y > 0.0);
    assert!((forces.buoyancy.point - Vec2::new(0.0, -0.25)).length() < 1e-5);
    assert!(forces.edges.iter().all(|e| e.total() == Vec2::ZERO));
  }

  #[test]
  fn only_leading_edges_get_drag() {
    let pieces = vec![SubmergedPolygon::new(box_2x1())];
    let params = BuoyancyParams::default();
    // Object moving right through still water.
    let forces = physics_based_forces(&pieces, |_| Vec2::new(-2.0, 0.0), &params);

    let mut saw_leading_drag = false;
    for edge in &forces.edges {
      if edge.is_leading() {
        if edge.normal.x > 0.5 {
          assert!(edge.drag.x < 0.0, "drag must oppose motion");
          saw_leading_drag = true;
        }
      } else {
        assert_eq!(edge.drag, Vec2::ZERO);
        assert_eq!(edge.lift, Vec2::ZERO);
      }
    }
    assert!(saw_leading_drag);
    let trailing = forces.edges.iter().filter(|e| !e.is_leading()).count();
    assert_eq!(trailing, 1);
  }

  #[test]
  fn drag_is_clamped() {
    let pieces = vec![SubmergedPolygon::new(box_2x1())];
    let params = BuoyancyParams {
      max_drag: 3.0,
      ..Default::default()
    };
    let forces = physics_based_forces(&pieces, |_| Vec2::new(-100.0, 0.0), &params);
    for edge in &forces.edges {
      assert!(edge.drag.length() <= 3.0 + 1e-4);
    }
  }

  #[test]
  fn flow_pushes_upstream_edges() {
    let pieces = vec![SubmergedPolygon::new(box_2x1())];
    let params = BuoyancyParams {
      flow: FlowParams {
        enabled: true,
        direction: [1.0, 0.0],
        strength: 2.0,
      },
      ..Default::default()
    };
    let forces = physics_based_forces(&pieces, |_| Vec2::ZERO, &params);
    let pushed: Vec<&EdgeForce> = forces.edges.iter().filter(|e| e.flow != Vec2::ZERO).collect();
    assert_eq!(pushed.len(), 1);
    assert!(pushed[0].normal.x < -0.5);
    // Left edge has length 1.
    assert!((pushed[0].flow.x - 2.0).abs() < 1e-5);
  }

  #[test]
  fn off_centre_buoyancy_produces_torque() {
    let pieces = half_submerged();
    let forces = physics_based_forces(&pieces, |_| Vec2::ZERO, &BuoyancyParams::default());
    assert!(forces.torque_about(Vec2::new(-1.0, 0.0)) > 0.0);
    assert!(forces.torque_about(Vec2::new(0.0, 0.0)).abs() < 1e-4);
  }

  #[test]
  fn empty_submersion_is_zero() {
    let forces = physics_based_forces(&[], |_| Vec2::ONE, &BuoyancyParams::default());
    assert_eq!(forces, PhysicsForces::default());
    assert_eq!(forces.point_forces().count(), 0);
  }
}
