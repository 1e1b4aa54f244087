//! Sampled waterline used as the clip boundary.

use bevy::math::Vec2;

/// World-space points sampled along the surface at a fixed stride.
///
/// Rebuilt only when the source surface moved by more than `epsilon` since
/// the last sample, so a calm surface costs nothing per tick.
#[derive(Clone, Debug)]
pub struct WaterLine {
  points: Vec<Vec2>,
  /// Surface heights the current points were sampled from.
  sampled_heights: Vec<f32>,
  stride: usize,
  epsilon: f32,
  revision: u64,
}

impl WaterLine {
  pub fn new(stride: usize, epsilon: f32) -> Self {
    Self {
      points: Vec::new(),
      sampled_heights: Vec::new(),
      stride: stride.max(1),
      epsilon,
      revision: 0,
    }
  }

  /// Resamples from `surface` (left to right) if it moved. Returns true when
  /// the points were rebuilt.
  pub fn update(&mut self, surface: &[Vec2]) -> bool {
    if !self.needs_rebuild(surface) {
      return false;
    }

    self.sampled_heights.clear();
    self.sampled_heights.extend(surface.iter().map(|p| p.y));

    self.points.clear();
    self
      .points
      .extend(surface.iter().step_by(self.stride).copied());
    // The right edge is always part of the boundary.
    if let Some(&last) = surface.last()
      && self.points.last() != Some(&last)
    {
      self.points.push(last);
    }

    self.revision += 1;
    true
  }

  fn needs_rebuild(&self, surface: &[Vec2]) -> bool {
    if surface.len() != self.sampled_heights.len() || self.points.is_empty() {
      return true;
    }
    // Horizontal moves (resize, translation) also invalidate the samples.
    let first_moved = self
      .points
      .first()
      .zip(surface.first())
      .is_some_and(|(a, b)| (a.x - b.x).abs() > self.epsilon);
    first_moved
      || surface
        .iter()
        .zip(&self.sampled_heights)
        .any(|(p, &h)| (p.y - h).abs() > self.epsilon)
  }

  pub fn points(&self) -> &[Vec2] {
    &self.points
  }

  /// Incremented on every rebuild.
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Linearly interpolated surface height at `x`, clamped to the ends.
  pub fn height_at(&self, x: f32) -> Option<f32> {
    let first = *self.points.first()?;
    let last = *self.points.last()?;
    if x <= first.x {
      return Some(first.y);
    }
    if x >= last.x {
      return Some(last.y);
    }
    let idx = self.points.partition_point(|p| p.x <= x);
    let a = self.points[idx - 1];
    let b = self.points[idx];
    let span = b.x - a.x;
    if span <= f32::EPSILON {
      return Some(a.y);
    }
    Some(a.y + (b.y - a.y) * (x - a.x) / span)
  }
}
