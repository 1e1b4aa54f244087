//! Ambient sine-wave overlay.
//!
//! Purely cosmetic offset added on top of the simulated state when it is
//! published. It never feeds back into the spring chain or the heightmap.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SineWaves {
  pub enabled: bool,
  /// Peak offset (world units for the spring surface, normalized height for
  /// the heightmap composite).
  pub amplitude: f32,
  /// Distance between crests in world units.
  pub wavelength: f32,
  /// Phase speed in radians per second.
  pub speed: f32,
}

impl Default for SineWaves {
  fn default() -> Self {
    Self {
      enabled: false,
      amplitude: 0.05,
      wavelength: 4.0,
      speed: 1.5,
    }
  }
}

impl SineWaves {
  /// Offset at world position `x` and simulation time `time`.
  #[inline]
  pub fn offset(&self, x: f32, time: f32) -> f32 {
    if !self.enabled || self.wavelength <= 0.0 {
      return 0.0;
    }
    self.amplitude * (TAU * x / self.wavelength + self.speed * time).sin()
  }
}
