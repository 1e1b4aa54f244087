//! Seam between the water simulation and the rigid-body integrator.

use std::hash::Hash;

use bevy::math::{Affine2, Vec2};

/// Kinematic snapshot of a body for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
  pub transform: Affine2,
  pub linear_velocity: Vec2,
  /// Radians per second, counter-clockwise positive.
  pub angular_velocity: f32,
  /// World-space centre of mass.
  pub center_of_mass: Vec2,
}

impl BodyState {
  /// A motionless body whose centre of mass is its origin.
  pub fn at_rest(transform: Affine2) -> Self {
    Self {
      transform,
      linear_velocity: Vec2::ZERO,
      angular_velocity: 0.0,
      center_of_mass: transform.translation,
    }
  }

  #[inline]
  pub fn position(&self) -> Vec2 {
    self.transform.translation
  }

  /// Body-local +Y in world space.
  #[inline]
  pub fn up(&self) -> Vec2 {
    self.transform.matrix2.y_axis.normalize_or_zero()
  }

  /// Velocity of the material point at world `point`.
  #[inline]
  pub fn point_velocity(&self, point: Vec2) -> Vec2 {
    let r = point - self.center_of_mass;
    self.linear_velocity + self.angular_velocity * r.perp()
  }
}

/// Access to the rigid bodies behind floating objects.
///
/// Implemented by the host's physics integration; the water simulation only
/// reads snapshots and hands back forces.
pub trait BodyAdapter {
  type Key: Copy + Eq + Hash + Send + Sync;

  /// False once the body's collider is gone.
  fn is_alive(&self, key: Self::Key) -> bool;

  /// Current snapshot, or `None` if the body no longer exists.
  fn state(&self, key: Self::Key) -> Option<BodyState>;

  fn apply_force_at_point(&mut self, key: Self::Key, force: Vec2, point: Vec2);

  fn apply_torque(&mut self, key: Self::Key, torque: f32);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spinning_body_point_velocity() {
    let state = BodyState {
      angular_velocity: 2.0,
      ..BodyState::at_rest(Affine2::IDENTITY)
    };
    assert_eq!(state.point_velocity(Vec2::X), Vec2::new(0.0, 2.0));
    assert_eq!(state.point_velocity(Vec2::Y), Vec2::new(-2.0, 0.0));
  }

  #[test]
  fn up_follows_rotation() {
    let state = BodyState::at_rest(Affine2::from_angle(std::f32::consts::FRAC_PI_2));
    assert!((state.up() - Vec2::new(-1.0, 0.0)).length() < 1e-6);
  }
}
