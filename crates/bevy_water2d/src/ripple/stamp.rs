//! Ripple stamps queued for the next heightmap sub-step.

use std::f32::consts::PI;

use bevy::log::debug;
use bevy::math::Vec2;

use super::buffer::HeightGrid;
use super::obstruction::ObstructionMask;

/// Stamps accepted between two consumptions; the rest are dropped.
pub const MAX_RIPPLES_PER_TICK: usize = 10;

/// A ripple in normalized heightmap coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RippleEvent {
  pub uv: Vec2,
  /// Radius as a fraction of the heightmap width.
  pub radius: f32,
  /// Peak height change at the centre, in normalized units.
  pub strength: f32,
}

/// Bounded queue of pending ripple stamps.
#[derive(Clone, Debug, Default)]
pub struct RippleQueue {
  events: Vec<RippleEvent>,
  dropped: u64,
}

impl RippleQueue {
  /// Queues `event`; returns false (and counts it) when the queue is full.
  pub fn push(&mut self, event: RippleEvent) -> bool {
    if self.events.len() >= MAX_RIPPLES_PER_TICK {
      self.dropped += 1;
      debug!("Ripple queue full, dropping stamp at {:?}", event.uv);
      return false;
    }
    self.events.push(event);
    true
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  /// Total stamps dropped since creation.
  pub fn dropped(&self) -> u64 {
    self.dropped
  }

  pub fn drain(&mut self) -> std::vec::Drain<'_, RippleEvent> {
    self.events.drain(..)
  }
}

/// Adds a cosine-falloff bump to `grid`. Cells outside the radius and
/// obstructed cells are left untouched.
pub fn stamp(grid: &mut HeightGrid, mask: &ObstructionMask, event: &RippleEvent) {
  let width = grid.width();
  let height = grid.height();
  let radius = event.radius * width as f32;
  if radius <= 0.0 || event.strength == 0.0 {
    return;
  }
  let center = Vec2::new(event.uv.x * width as f32, event.uv.y * height as f32);

  let x0 = (center.x - radius).floor().max(0.0) as usize;
  let y0 = (center.y - radius).floor().max(0.0) as usize;
  let x1 = ((center.x + radius).ceil().max(0.0) as usize).min(width);
  let y1 = ((center.y + radius).ceil().max(0.0) as usize).min(height);

  for y in y0..y1 {
    for x in x0..x1 {
      if mask.is_blocked(x, y) {
        continue;
      }
      let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
      if d >= radius {
        continue;
      }
      let falloff = 0.5 * (1.0 + (PI * d / radius).cos());
      let value = grid.get(x, y) + event.strength * falloff;
      grid.set(x, y, value.clamp(0.0, 1.0));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ripple::buffer::NEUTRAL_HEIGHT;

  #[test]
  fn queue_drops_beyond_cap() {
    let mut queue = RippleQueue::default();
    let event = RippleEvent {
      uv: Vec2::splat(0.5),
      radius: 0.1,
      strength: 0.2,
    };
    let accepted = (0..15).filter(|_| queue.push(event)).count();
    assert_eq!(accepted, MAX_RIPPLES_PER_TICK);
    assert_eq!(queue.dropped(), 5);
    assert_eq!(queue.drain().count(), MAX_RIPPLES_PER_TICK);
    assert!(queue.is_empty());
  }

  #[test]
  fn stamp_stays_inside_radius() {
    let mut grid = HeightGrid::new(20, 20);
    let mask = ObstructionMask::none(20, 20);
    stamp(
      &mut grid,
      &mask,
      &RippleEvent {
        uv: Vec2::splat(0.5),
        radius: 0.2,
        strength: 0.3,
      },
    );
    // Radius of 4 cells around (10, 10).
    assert!(grid.get(10, 10) > NEUTRAL_HEIGHT);
    assert_eq!(grid.get(0, 0), NEUTRAL_HEIGHT);
    assert_eq!(grid.get(10, 15), NEUTRAL_HEIGHT);
    assert!(grid.cells().iter().all(|&c| (0.0..=1.0).contains(&c)));
  }
}
