//! Spring-chain surface: a damped oscillator per vertex along the top edge,
//! coupled to its neighbours by a spread coefficient.
//!
//! Advanced once per fixed tick. The update is a discretized wave equation:
//!
//! 1. every vertex integrates its own damped spring,
//! 2. neighbour deltas are computed from the post-spring heights,
//! 3. the deltas are applied to neighbour velocities.
//!
//! Steps 2 and 3 are separate passes so that the result does not depend on
//! iteration order.

use std::ops::RangeInclusive;

use bevy::log::warn;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::waves::SineWaves;

/// Hard cap on the number of surface vertices.
pub const MAX_SURFACE_VERTICES: usize = 32_000;

/// Tuning for the spring chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
  /// Restoring force per unit displacement.
  pub spring_constant: f32,
  /// Velocity damping per tick (0 = none).
  pub damping: f32,
  /// Fraction of the height difference passed to each neighbour.
  pub spread: f32,
  /// Multiplier on neighbour coupling.
  pub wave_speed: f32,
  /// Surface resolution: vertices per world unit.
  pub segments_per_unit: f32,
}

impl Default for SpringParams {
  fn default() -> Self {
    Self {
      spring_constant: 0.02,
      damping: 0.04,
      spread: 0.05,
      wave_speed: 1.0,
      segments_per_unit: 4.0,
    }
  }
}

/// State of a single surface sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceVertex {
  /// Vertical offset from the resting waterline.
  pub displacement: f32,
  pub velocity: f32,
  pub acceleration: f32,
}

/// How an external disturbance combines with the current velocity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisturbMode {
  Add,
  Set,
}

/// CPU spring-chain water surface.
#[derive(Clone, Debug)]
pub struct SpringSurface {
  left: f32,
  width: f32,
  waterline: f32,
  /// Effective resolution after the vertex cap.
  segments_per_unit: f32,
  vertices: Vec<SurfaceVertex>,
  /// Transient (left, right) coupling deltas.
  deltas: Vec<(f32, f32)>,
  params: SpringParams,
  resolution_clamped: bool,
}

impl SpringSurface {
  /// Creates a calm surface spanning `[left, left + width]` at `waterline`.
  pub fn new(left: f32, width: f32, waterline: f32, params: SpringParams) -> Self {
    let mut surface = Self {
      left,
      width,
      waterline,
      segments_per_unit: params.segments_per_unit,
      vertices: Vec::new(),
      deltas: Vec::new(),
      params,
      resolution_clamped: false,
    };
    let spu = surface.params.segments_per_unit;
    surface.resize(width, spu);
    surface
  }

  /// Number of vertices for a given width and resolution, and the
  /// resolution actually used once the vertex cap applies.
  pub fn vertex_count_for(width: f32, segments_per_unit: f32) -> (usize, f32) {
    let wanted = (width.max(0.0) * segments_per_unit.max(0.0)).ceil() as usize + 1;
    if wanted <= MAX_SURFACE_VERTICES {
      return (wanted.max(2), segments_per_unit);
    }
    let clamped_spu = (MAX_SURFACE_VERTICES - 1) as f32 / width;
    (MAX_SURFACE_VERTICES, clamped_spu)
  }

  /// Changes width or resolution, keeping existing vertex offsets.
  ///
  /// Growing repeats the last vertex; shrinking truncates. Returns true if
  /// the requested resolution had to be lowered to respect
  /// [`MAX_SURFACE_VERTICES`].
  pub fn resize(&mut self, width: f32, segments_per_unit: f32) -> bool {
    let (count, effective_spu) = Self::vertex_count_for(width, segments_per_unit);
    let clamped = effective_spu < segments_per_unit;
    if clamped {
      warn!(
        "Water surface of width {width} needs more than {MAX_SURFACE_VERTICES} vertices at \
         {segments_per_unit}/unit; lowering resolution to {effective_spu:.3}/unit"
      );
    }

    self.width = width;
    self.segments_per_unit = effective_spu;
    self.resolution_clamped = clamped;

    let fill = self.vertices.last().copied().unwrap_or_default();
    self.vertices.resize(count, fill);
    self.deltas.resize(count, (0.0, 0.0));
    clamped
  }

  /// Moves the resting waterline; offsets are relative to it and survive.
  pub fn set_waterline(&mut self, waterline: f32) {
    self.waterline = waterline;
  }

  /// Moves the left edge without touching vertex state.
  pub fn set_left(&mut self, left: f32) {
    self.left = left;
  }

  pub fn params(&self) -> &SpringParams {
    &self.params
  }

  pub fn vertices(&self) -> &[SurfaceVertex] {
    &self.vertices
  }

  pub fn waterline(&self) -> f32 {
    self.waterline
  }

  pub fn segments_per_unit(&self) -> f32 {
    self.segments_per_unit
  }

  pub fn resolution_clamped(&self) -> bool {
    self.resolution_clamped
  }

  /// World X of vertex `index`.
  #[inline]
  pub fn vertex_x(&self, index: usize) -> f32 {
    (self.left + index as f32 / self.segments_per_unit).min(self.left + self.width)
  }

  /// Advances the chain by one fixed tick.
  #[cfg_attr(feature = "tracy", tracing::instrument(skip_all, name = "spring_step"))]
  pub fn step(&mut self) {
    let SpringParams {
      spring_constant,
      damping,
      spread,
      wave_speed,
      ..
    } = self.params;

    for v in &mut self.vertices {
      v.acceleration = -spring_constant * v.displacement - v.velocity * damping;
      v.velocity += v.acceleration;
      v.displacement += v.velocity;
    }

    let n = self.vertices.len();
    for i in 0..n {
      let h = self.vertices[i].displacement;
      let left = if i > 0 {
        spread * (h - self.vertices[i - 1].displacement)
      } else {
        0.0
      };
      let right = if i + 1 < n {
        spread * (h - self.vertices[i + 1].displacement)
      } else {
        0.0
      };
      self.deltas[i] = (left, right);
    }

    for i in 0..n {
      let (left, right) = self.deltas[i];
      if i > 0 {
        self.vertices[i - 1].velocity += left * wave_speed;
      }
      if i + 1 < n {
        self.vertices[i + 1].velocity += right * wave_speed;
      }
    }
  }

  /// Vertex indices covered by a disturbance of `radius` around world `x`,
  /// or `None` when it misses the surface.
  pub fn index_range(&self, x: f32, radius: f32) -> Option<RangeInclusive<usize>> {
    let radius = radius.max(0.0);
    let start = x - radius - self.left;
    let end = x + radius - self.left;
    if end < 0.0 || start > self.width || self.vertices.is_empty() {
      return None;
    }
    let last = self.vertices.len() - 1;
    let first = ((start.max(0.0) * self.segments_per_unit).floor() as usize).min(last);
    let final_idx = ((end.min(self.width) * self.segments_per_unit).floor() as usize).min(last);
    Some(first..=final_idx)
  }

  /// Applies a velocity disturbance around world `x`. Returns the touched
  /// index range.
  pub fn disturb(
    &mut self,
    x: f32,
    radius: f32,
    velocity: f32,
    mode: DisturbMode,
  ) -> Option<RangeInclusive<usize>> {
    let range = self.index_range(x, radius)?;
    for v in &mut self.vertices[range.clone()] {
      match mode {
        DisturbMode::Add => v.velocity += velocity,
        DisturbMode::Set => v.velocity = velocity,
      }
    }
    Some(range)
  }

  /// Published top edge in world space, left to right.
  pub fn surface_points(&self, waves: &SineWaves, time: f32) -> Vec<Vec2> {
    self
      .vertices
      .iter()
      .enumerate()
      .map(|(i, v)| {
        let x = self.vertex_x(i);
        Vec2::new(x, self.waterline + v.displacement + waves.offset(x, time))
      })
      .collect()
  }

  /// Sum of squared vertex velocities.
  pub fn kinetic_energy(&self) -> f32 {
    self.vertices.iter().map(|v| v.velocity * v.velocity).sum()
  }

  /// Kinetic plus spring potential energy.
  pub fn energy(&self) -> f32 {
    let k = self.params.spring_constant;
    self
      .vertices
      .iter()
      .map(|v| v.velocity * v.velocity + k * v.displacement * v.displacement)
      .sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pool() -> SpringSurface {
    SpringSurface::new(0.0, 10.0, 0.0, SpringParams::default())
  }

  #[test]
  fn vertex_count_follows_resolution() {
    let surface = pool();
    assert_eq!(surface.vertices().len(), 41);
    assert_eq!(surface.vertex_x(40), 10.0);
  }

  #[test]
  fn energy_decays_without_events() {
    let mut surface = pool();
    surface.disturb(5.0, 0.0, 1.0, DisturbMode::Add);

    let mut previous_peak = f32::INFINITY;
    for _ in 0..10 {
      let mut peak = 0.0f32;
      for _ in 0..100 {
        surface.step();
        peak = peak.max(surface.kinetic_energy());
      }
      assert!(
        peak < previous_peak,
        "peak kinetic energy {peak} did not drop below {previous_peak}"
      );
      previous_peak = peak;
    }
    assert!(surface.energy() < 1e-6);
  }

  #[test]
  fn coupling_is_order_independent() {
    let mut surface = pool();
    surface.disturb(5.0, 0.0, 1.0, DisturbMode::Set);
    let mid = surface.index_range(5.0, 0.0).unwrap();
    let mid = *mid.start();
    surface.step();
    let v = surface.vertices();
    assert_eq!(v[mid - 1].velocity, v[mid + 1].velocity);
    assert_eq!(v[mid - 2].velocity, v[mid + 2].velocity);
  }

  #[test]
  fn disturbance_range_is_clamped() {
    let surface = pool();
    assert_eq!(surface.index_range(-1.0, 2.0), Some(0..=4));
    assert_eq!(surface.index_range(9.5, 5.0), Some(38..=40));
    assert_eq!(surface.index_range(20.0, 1.0), None);
  }

  #[test]
  fn set_mode_overwrites_velocity() {
    let mut surface = pool();
    surface.disturb(2.0, 0.5, 3.0, DisturbMode::Add);
    surface.disturb(2.0, 0.5, -1.0, DisturbMode::Set);
    let range = surface.index_range(2.0, 0.5).unwrap();
    assert!(surface.vertices()[range].iter().all(|v| v.velocity == -1.0));
  }

  #[test]
  fn resize_preserves_offsets() {
    let mut surface = pool();
    for _ in 0..3 {
      surface.disturb(9.8, 0.5, 0.5, DisturbMode::Add);
      surface.step();
    }
    let before: Vec<f32> = surface.vertices().iter().map(|v| v.displacement).collect();
    let last = *before.last().unwrap();

    surface.resize(12.0, 4.0);
    let grown = surface.vertices();
    assert_eq!(grown.len(), 49);
    for (i, v) in before.iter().enumerate() {
      assert_eq!(grown[i].displacement, *v);
    }
    assert!(grown[41..].iter().all(|v| v.displacement == last));

    surface.resize(5.0, 4.0);
    assert_eq!(surface.vertices().len(), 21);
    assert_eq!(surface.vertices()[20].displacement, before[20]);
  }

  #[test]
  fn waterline_move_keeps_offsets() {
    let mut surface = pool();
    surface.disturb(5.0, 0.0, 1.0, DisturbMode::Add);
    surface.step();
    let before = surface.surface_points(&SineWaves::default(), 0.0);
    surface.set_waterline(3.0);
    let after = surface.surface_points(&SineWaves::default(), 0.0);
    for (a, b) in before.iter().zip(&after) {
      assert!((b.y - a.y - 3.0).abs() < 1e-6);
    }
  }

  #[test]
  fn oversized_surface_is_clamped() {
    let mut surface = pool();
    let clamped = surface.resize(100_000.0, 4.0);
    assert!(clamped);
    assert!(surface.resolution_clamped());
    assert_eq!(surface.vertices().len(), MAX_SURFACE_VERTICES);
  }
}
