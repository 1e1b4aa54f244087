//! Buoyancy, drag, lift and flow forces from submerged geometry.
//!
//! Two models are available:
//!
//! - [`physics_based_forces`]: Archimedes buoyancy at the submerged centroid
//!   plus per-edge drag and lift on leading edges, and an optional current
//!   push.
//! - [`linear_forces`]: a float-height spring with quadratic drag, for
//!   objects whose silhouette is a poor proxy for their mass.
//!
//! Forces are returned as values; applying them is the host's job.

mod linear;
mod physics_based;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

pub use linear::{LinearForces, linear_forces};
pub use physics_based::{EdgeForce, PhysicsForces, PointForce, physics_based_forces};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuoyancyMethod {
  #[default]
  PhysicsBased,
  Linear,
}

/// Constant current pushing on upstream-facing edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
  pub enabled: bool,
  pub direction: [f32; 2],
  /// Force per unit of edge length.
  pub strength: f32,
}

impl Default for FlowParams {
  fn default() -> Self {
    Self {
      enabled: false,
      direction: [1.0, 0.0],
      strength: 1.0,
    }
  }
}

impl FlowParams {
  /// Normalized flow direction, or `None` when the flow is off.
  pub fn direction(&self) -> Option<Vec2> {
    if !self.enabled || self.strength == 0.0 {
      return None;
    }
    Vec2::from(self.direction).try_normalize()
  }
}

/// Tuning for the simplified float-height model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearParams {
  /// Height above the waterline at which lift fades to zero.
  pub float_height: f32,
  /// Vertical velocity damping folded into the lift factor.
  pub bounce_damping: f32,
  pub force_scale: f32,
  /// Quadratic drag coefficient on planar velocity.
  pub planar_drag: f32,
  /// Torque per unit of angular velocity opposing spin.
  pub angular_drag: f32,
}

impl Default for LinearParams {
  fn default() -> Self {
    Self {
      float_height: 1.0,
      bounce_damping: 0.1,
      force_scale: 1.0,
      planar_drag: 0.5,
      angular_drag: 0.2,
    }
  }
}

/// Configuration shared by both force models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyParams {
  pub method: BuoyancyMethod,
  /// External gravity; buoyancy acts against it.
  pub gravity: [f32; 2],
  pub density: f32,
  pub drag_coefficient: f32,
  pub lift_coefficient: f32,
  pub max_drag: f32,
  pub max_lift: f32,
  pub flow: FlowParams,
  pub linear: LinearParams,
  /// Scale applied to every force on player-controlled objects.
  pub player_force_multiplier: f32,
}

impl Default for BuoyancyParams {
  fn default() -> Self {
    Self {
      method: BuoyancyMethod::PhysicsBased,
      gravity: [0.0, -9.8],
      density: 1.0,
      drag_coefficient: 0.25,
      lift_coefficient: 0.25,
      max_drag: 500.0,
      max_lift: 500.0,
      flow: FlowParams::default(),
      linear: LinearParams::default(),
      player_force_multiplier: 1.0,
    }
  }
}

impl BuoyancyParams {
  #[inline]
  pub fn gravity(&self) -> Vec2 {
    Vec2::from(self.gravity)
  }

  /// Force multiplier for an object.
  #[inline]
  pub fn multiplier(&self, is_player: bool) -> f32 {
    if is_player {
      self.player_force_multiplier
    } else {
      1.0
    }
  }
}
