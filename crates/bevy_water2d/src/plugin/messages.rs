//! Messages emitted and consumed by the water systems.

use bevy::prelude::*;

use crate::floating::ExitReason;

/// An object entered a water trigger volume.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct EnteredWater {
  pub water: Entity,
  pub entity: Entity,
}

/// An object left a water trigger volume or was destroyed inside it.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct ExitedWater {
  pub water: Entity,
  pub entity: Entity,
  pub reason: ExitReason,
}

/// An object hit the surface fast enough to splash.
///
/// `play_sound` and `spawn_particles` are each true at most once per
/// submersion.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct Splashed {
  pub water: Entity,
  pub entity: Entity,
  pub position: Vec2,
  pub speed: f32,
  pub play_sound: bool,
  pub spawn_particles: bool,
}

/// Asks for a ripple at world `(x, z)`.
///
/// With `water: None` every water whose horizontal span contains `x`
/// receives it.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct RippleRequest {
  pub water: Option<Entity>,
  pub position: Vec2,
  pub radius: f32,
  pub strength: f32,
}

impl RippleRequest {
  pub fn at(position: Vec2, radius: f32, strength: f32) -> Self {
    Self {
      water: None,
      position,
      radius,
      strength,
    }
  }
}
