//! Bridge between rapier rigid bodies and floating objects.
//!
//! Rapier applies [`ExternalForce`] at the centre of mass; the torque in
//! [`WaterForces`] is taken about the entity origin, which matches for
//! bodies whose collider is centred on the origin.

use bevy::prelude::*;
use bevy_rapier2d::prelude::{ExternalForce, Velocity};

use super::components::{Floating, FloatingVelocity, WaterForces};

pub fn sync_rapier_velocity(
  mut bodies: Query<(&Velocity, &mut FloatingVelocity), With<Floating>>,
) {
  for (velocity, mut floating) in bodies.iter_mut() {
    floating.linear = velocity.linvel;
    floating.angular = velocity.angvel;
  }
}

pub fn apply_rapier_forces(
  mut bodies: Query<(&WaterForces, &mut ExternalForce), With<Floating>>,
) {
  for (forces, mut external) in bodies.iter_mut() {
    external.force = forces.force;
    external.torque = forces.torque;
  }
}
