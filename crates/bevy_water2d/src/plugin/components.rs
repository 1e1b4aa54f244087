//! Components attached by hosts and maintained by the water systems.

use bevy::prelude::*;

use crate::geometry::Shape;
use crate::water::WaterBody;

/// A body of water. Created through [`crate::plugin::SpawnWater2d`].
#[derive(Component)]
pub struct Water {
  body: WaterBody<Entity>,
}

impl Water {
  pub fn new(body: WaterBody<Entity>) -> Self {
    Self { body }
  }

  pub fn body(&self) -> &WaterBody<Entity> {
    &self.body
  }

  pub fn body_mut(&mut self) -> &mut WaterBody<Entity> {
    &mut self.body
  }
}

/// An object that floats in any water it overlaps.
///
/// The silhouette is in the entity's local space; scale is not applied.
#[derive(Component, Clone, Debug)]
#[require(Transform, FloatingVelocity, WaterForces, Submersion)]
pub struct Floating {
  pub shape: Shape,
  /// Forces are scaled by the player multiplier.
  pub is_player: bool,
}

impl Floating {
  pub fn new(shape: Shape) -> Self {
    Self {
      shape,
      is_player: false,
    }
  }

  pub fn player(mut self) -> Self {
    self.is_player = true;
    self
  }
}

/// Velocity of a floating body, written by the host's integrator (or the
/// rapier bridge) before each water tick.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatingVelocity {
  pub linear: Vec2,
  pub angular: f32,
}

/// Net water force of the last tick, about the entity's translation.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct WaterForces {
  pub force: Vec2,
  pub torque: f32,
}

/// Which water an object is in and how much of it is under the surface.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Submersion {
  pub water: Option<Entity>,
  pub submerged_area: f32,
}

impl Submersion {
  pub fn is_submerged(&self) -> bool {
    self.submerged_area > 0.0
  }
}

/// Shortest period a [`RippleSource`] accepts.
pub const MIN_RIPPLE_PERIOD_SECS: f32 = 1.0 / 64.0;

/// Emits a ripple every `timer` period at the entity's `(x, z)` position.
#[derive(Component, Clone, Debug)]
pub struct RippleSource {
  pub timer: Timer,
  pub radius: f32,
  pub strength: f32,
}

impl RippleSource {
  /// Periods below [`MIN_RIPPLE_PERIOD_SECS`] (or NaN) are raised to it.
  pub fn new(period_secs: f32, radius: f32, strength: f32) -> Self {
    let period = period_secs.max(MIN_RIPPLE_PERIOD_SECS);
    let period = if period.is_finite() { period } else { MIN_RIPPLE_PERIOD_SECS };
    Self {
      timer: Timer::from_seconds(period, TimerMode::Repeating),
      radius,
      strength,
    }
  }
}

/// Live collider that blocks heightmap ripples (boxes and circles only).
#[derive(Component, Clone, Debug)]
pub struct WaterObstruction {
  pub shape: Shape,
}

/// Short-lived splash marker, despawned when its timer ends.
#[derive(Component, Clone, Debug)]
pub struct SplashEffect {
  pub timer: Timer,
  pub source: Entity,
}

impl SplashEffect {
  /// Negative or non-finite lifetimes expire on the next update.
  pub fn new(lifetime_secs: f32, source: Entity) -> Self {
    let lifetime = if lifetime_secs.is_finite() {
      lifetime_secs.max(0.0)
    } else {
      0.0
    };
    Self {
      timer: Timer::from_seconds(lifetime, TimerMode::Once),
      source,
    }
  }
}
