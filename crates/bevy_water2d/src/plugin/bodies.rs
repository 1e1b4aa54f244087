//! [`BodyAdapter`] over ECS floating bodies.

use bevy::math::Affine2;
use bevy::prelude::*;

use super::components::{Floating, FloatingVelocity, WaterForces};
use crate::floating::{BodyAdapter, BodyState};

pub(crate) type FloatingBodies<'w, 's> = Query<
  'w,
  's,
  (
    &'static GlobalTransform,
    &'static FloatingVelocity,
    &'static mut WaterForces,
  ),
  With<Floating>,
>;

/// Planar pose of a 3D transform: XY translation and rotation about Z.
pub(crate) fn planar_affine(transform: &GlobalTransform) -> Affine2 {
  let (_, rotation, translation) = transform.to_scale_rotation_translation();
  Affine2::from_angle_translation(
    rotation.to_euler(EulerRot::ZYX).0,
    translation.truncate(),
  )
}

/// Reads poses and velocities from the world and accumulates forces into
/// [`WaterForces`].
pub(crate) struct EcsBodies<'a, 'w, 's> {
  pub query: &'a mut FloatingBodies<'w, 's>,
}

impl BodyAdapter for EcsBodies<'_, '_, '_> {
  type Key = Entity;

  fn is_alive(&self, key: Entity) -> bool {
    self.query.contains(key)
  }

  fn state(&self, key: Entity) -> Option<BodyState> {
    let (transform, velocity, _) = self.query.get(key).ok()?;
    let transform = planar_affine(transform);
    Some(BodyState {
      transform,
      linear_velocity: velocity.linear,
      angular_velocity: velocity.angular,
      center_of_mass: transform.translation,
    })
  }

  fn apply_force_at_point(&mut self, key: Entity, force: Vec2, point: Vec2) {
    let Ok((transform, _, mut forces)) = self.query.get_mut(key) else {
      return;
    };
    let lever = point - transform.translation().truncate();
    forces.force += force;
    forces.torque += lever.perp_dot(force);
  }

  fn apply_torque(&mut self, key: Entity, torque: f32) {
    if let Ok((_, _, mut forces)) = self.query.get_mut(key) {
      forces.torque += torque;
    }
  }
}
