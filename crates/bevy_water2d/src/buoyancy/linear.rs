//! Float-height spring model.

use bevy::math::Vec2;

use super::BuoyancyParams;

/// Output of [`linear_forces`]. Lift and drag act at the centre of mass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearForces {
  pub lift: Vec2,
  pub drag: Vec2,
  pub torque: f32,
}

impl LinearForces {
  #[inline]
  pub fn total(&self) -> Vec2 {
    self.lift + self.drag
  }

  pub fn scale(&mut self, factor: f32) {
    self.lift *= factor;
    self.drag *= factor;
    self.torque *= factor;
  }
}

/// Lift proportional to how far the object sits below its float height.
///
/// `height_above_waterline` is positive above the surface. The lift factor
/// `1 - height / float_height` reaches zero at the float height; above it
/// the object receives no force at all.
pub fn linear_forces(
  height_above_waterline: f32,
  velocity: Vec2,
  angular_velocity: f32,
  params: &BuoyancyParams,
) -> LinearForces {
  let linear = &params.linear;
  if linear.float_height <= 0.0 {
    return LinearForces::default();
  }
  let factor = 1.0 - height_above_waterline / linear.float_height;
  if factor < 0.0 {
    return LinearForces::default();
  }

  let lift = -params.gravity() * (factor - velocity.y * linear.bounce_damping) * linear.force_scale;
  let drag = -velocity * velocity.length() * linear.planar_drag;
  let torque = -angular_velocity * linear.angular_drag;

  LinearForces { lift, drag, torque }
}
