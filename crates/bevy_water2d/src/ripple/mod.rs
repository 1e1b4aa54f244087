//! Heightmap ripple simulation.
//!
//! A ping-pong pair of normalized height grids covers the water plane
//! (world X across, depth Z down the rows). Each sub-step:
//!
//! 1. pending ripple stamps are added to the current grid,
//! 2. the propagation kernel writes the next state into the previous grid,
//! 3. the buffers swap.
//!
//! After the sub-steps the `final` grid is composited from the current one
//! with optional smoothing and the ambient sine overlay. Heights are offsets
//! around [`NEUTRAL_HEIGHT`] and always clamped to `[0, 1]`.

mod buffer;
mod cadence;
mod obstruction;
mod stamp;

use bevy::log::debug;
use bevy::math::{UVec2, Vec2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use buffer::{HeightGrid, NEUTRAL_HEIGHT, PingPong};
pub use cadence::{CadenceClock, DEFAULT_MAX_CATCH_UP_STEPS, UpdateCadence};
pub use obstruction::{
  MAX_DYNAMIC_BOXES, MAX_DYNAMIC_CIRCLES, ObstructionConfig, ObstructionError, ObstructionMask,
  ObstructionReport, ObstructionShape,
};
pub use stamp::{MAX_RIPPLES_PER_TICK, RippleEvent, RippleQueue};

use crate::surface::SineWaves;

/// Tuning for the heightmap simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapParams {
  /// Grid cells per world unit.
  pub pixels_per_unit: f32,
  /// Multiplier on the propagated offset per sub-step (< 1 decays).
  pub damping: f32,
  /// Blend toward the 4-neighbour average when compositing (0 = off).
  pub smoothing: f32,
  pub cadence: UpdateCadence,
  pub max_catch_up_steps: u32,
  /// World depth (Z extent) of the water plane.
  pub surface_depth: f32,
  /// World height of one normalized unit of offset along the waterline.
  pub height_scale: f32,
}

impl Default for HeightmapParams {
  fn default() -> Self {
    Self {
      pixels_per_unit: 8.0,
      damping: 0.98,
      smoothing: 0.0,
      cadence: UpdateCadence::EveryTick,
      max_catch_up_steps: DEFAULT_MAX_CATCH_UP_STEPS,
      surface_depth: 2.0,
      height_scale: 1.0,
    }
  }
}

/// Running counters for truncations and work done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RippleStats {
  pub sub_steps: u64,
  /// `advance` calls that hit the catch-up cap.
  pub capped_advances: u64,
  pub dropped_obstructions: u64,
}

/// Double-buffered ripple heightmap over the water plane.
#[derive(Clone, Debug)]
pub struct HeightmapRipple {
  params: HeightmapParams,
  waves: SineWaves,
  left: f32,
  width: f32,
  water_z: f32,
  buffers: PingPong<HeightGrid>,
  composite: HeightGrid,
  queue: RippleQueue,
  mask: ObstructionMask,
  clock: CadenceClock,
  time: f32,
  stats: RippleStats,
}

impl HeightmapRipple {
  /// Creates a calm heightmap for water spanning `[left, left + width]` in X,
  /// centred on `water_z` in depth.
  pub fn new(
    left: f32,
    width: f32,
    water_z: f32,
    params: HeightmapParams,
    waves: SineWaves,
    obstruction: &ObstructionConfig,
  ) -> Result<Self, ObstructionError> {
    let size = Self::grid_size_for(width, params.surface_depth, params.pixels_per_unit);
    let (w, h) = (size.x as usize, size.y as usize);
    let mask = ObstructionMask::from_config(obstruction, w, h)?;
    debug!("Heightmap ripple grid {w}x{h}");
    Ok(Self {
      params,
      waves,
      left,
      width,
      water_z,
      buffers: PingPong::splat(HeightGrid::new(w, h)),
      composite: HeightGrid::new(w, h),
      queue: RippleQueue::default(),
      mask,
      clock: CadenceClock::default(),
      time: 0.0,
      stats: RippleStats::default(),
    })
  }

  /// Grid dimensions for a water plane of `width` by `depth` world units.
  pub fn grid_size_for(width: f32, depth: f32, pixels_per_unit: f32) -> UVec2 {
    let cells = |extent: f32| ((extent.max(0.0) * pixels_per_unit.max(0.0)).ceil() as u32).max(1);
    UVec2::new(cells(width), cells(depth))
  }

  pub fn size(&self) -> UVec2 {
    let grid = self.buffers.current();
    UVec2::new(grid.width() as u32, grid.height() as u32)
  }

  pub fn params(&self) -> &HeightmapParams {
    &self.params
  }

  pub fn stats(&self) -> RippleStats {
    self.stats
  }

  /// Stamps dropped because the per-tick queue was full.
  pub fn dropped_ripples(&self) -> u64 {
    self.queue.dropped()
  }

  pub fn pending_ripples(&self) -> usize {
    self.queue.len()
  }

  pub fn current(&self) -> &HeightGrid {
    self.buffers.current()
  }

  /// Composited output for rendering.
  pub fn final_grid(&self) -> &HeightGrid {
    &self.composite
  }

  /// World-space surface along the row at depth `water_z`, left to right,
  /// for a resting waterline at `rest_height`. Includes both edges of the
  /// water.
  pub fn surface_profile(&self, rest_height: f32) -> Vec<Vec2> {
    let grid = &self.composite;
    let width = grid.width();
    let row = ((0.5 * grid.height() as f32) as usize).min(grid.height() - 1);
    let cell_width = self.width / width as f32;
    let scale = self.params.height_scale;
    let height = |x: usize| rest_height + (grid.get(x, row) - NEUTRAL_HEIGHT) * scale;

    let mut points = Vec::with_capacity(width + 2);
    points.push(Vec2::new(self.left, height(0)));
    points.extend((0..width).map(|x| Vec2::new(self.left + (x as f32 + 0.5) * cell_width, height(x))));
    points.push(Vec2::new(self.left + self.width, height(width - 1)));
    points
  }

  pub fn mask(&self) -> &ObstructionMask {
    &self.mask
  }

  /// Normalized coordinates of world point `(x, z)`, clamped to `[0, 1]`.
  pub fn world_to_uv(&self, x: f32, z: f32) -> Vec2 {
    let u = if self.width > 0.0 {
      (x - self.left) / self.width
    } else {
      0.0
    };
    let v = if self.params.surface_depth > 0.0 {
      (z - self.water_z) / self.params.surface_depth + 0.5
    } else {
      0.5
    };
    Vec2::new(u, v).clamp(Vec2::ZERO, Vec2::ONE)
  }

  /// Converts a world radius into a fraction of the width.
  pub fn world_radius_to_uv(&self, radius: f32) -> f32 {
    if self.width > 0.0 {
      radius / self.width
    } else {
      0.0
    }
  }

  /// Queues a ripple stamp. Returns false if the per-tick cap dropped it.
  pub fn inject_ripple(&mut self, uv: Vec2, uv_radius: f32, strength: f32) -> bool {
    self.queue.push(RippleEvent {
      uv,
      radius: uv_radius,
      strength,
    })
  }

  /// Applies and clears every pending stamp.
  pub fn apply_pending_stamps(&mut self) {
    let current = self.buffers.current_mut();
    for event in self.queue.drain() {
      stamp::stamp(current, &self.mask, &event);
    }
  }

  /// Advances by `dt` seconds according to the cadence. Returns the
  /// number of sub-steps run.
  #[cfg_attr(feature = "tracy", tracing::instrument(skip_all, name = "ripple_advance"))]
  pub fn advance(&mut self, dt: f32) -> u32 {
    let max_steps = self.params.max_catch_up_steps;
    let steps = self.clock.steps(self.params.cadence, dt, max_steps);
    if let UpdateCadence::PerSecond { rate } = self.params.cadence
      && steps == max_steps
      && self.clock.backlog() * rate >= 1.0
    {
      self.stats.capped_advances += 1;
      debug!(
        "Heightmap catch-up capped at {max_steps} steps, {:.3}s deferred",
        self.clock.backlog()
      );
    }

    for _ in 0..steps {
      self.apply_pending_stamps();
      self.step();
    }
    self.time += dt;
    self.composite();
    steps
  }

  /// One propagation sub-step.
  pub fn step(&mut self) {
    let damping = self.params.damping;
    let mask = &self.mask;
    let (current, previous) = self.buffers.split_mut();
    let current = &*current;
    let width = current.width();

    previous
      .cells_mut()
      .par_chunks_mut(width)
      .enumerate()
      .for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
          if mask.is_blocked(x, y) {
            *cell = NEUTRAL_HEIGHT;
            continue;
          }
          let (xi, yi) = (x as isize, y as isize);
          let sum = current.offset_at(xi - 1, yi)
            + current.offset_at(xi + 1, yi)
            + current.offset_at(xi, yi - 1)
            + current.offset_at(xi, yi + 1);
          let next = (sum / 2.0 - (*cell - NEUTRAL_HEIGHT)) * damping;
          *cell = (next + NEUTRAL_HEIGHT).clamp(0.0, 1.0);
        }
      });

    self.buffers.swap();
    self.stats.sub_steps += 1;
  }

  fn composite(&mut self) {
    let current = self.buffers.current();
    let smoothing = self.params.smoothing.clamp(0.0, 1.0);
    let width = current.width();
    let cell_width = if width > 0 {
      self.width / width as f32
    } else {
      0.0
    };
    let (left, time, waves, mask) = (self.left, self.time, &self.waves, &self.mask);

    self
      .composite
      .cells_mut()
      .par_chunks_mut(width)
      .enumerate()
      .for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
          if mask.is_blocked(x, y) {
            *cell = NEUTRAL_HEIGHT;
            continue;
          }
          let (xi, yi) = (x as isize, y as isize);
          let own = current.offset_at(xi, yi);
          let mut offset = own;
          if smoothing > 0.0 {
            let average = (current.offset_at(xi - 1, yi)
              + current.offset_at(xi + 1, yi)
              + current.offset_at(xi, yi - 1)
              + current.offset_at(xi, yi + 1))
              / 4.0;
            offset = own + (average - own) * smoothing;
          }
          let world_x = left + (x as f32 + 0.5) * cell_width;
          offset += waves.offset(world_x, time);
          *cell = (offset + NEUTRAL_HEIGHT).clamp(0.0, 1.0);
        }
      });
  }

  /// Follows a moved or resized water body. Returns true when the grid was
  /// reallocated (and cleared to neutral).
  pub fn resize_world(&mut self, left: f32, width: f32, water_z: f32) -> bool {
    self.left = left;
    self.width = width;
    self.water_z = water_z;
    let size = Self::grid_size_for(width, self.params.surface_depth, self.params.pixels_per_unit);
    if size == self.size() {
      return false;
    }
    let (w, h) = (size.x as usize, size.y as usize);
    for grid in self.buffers.iter_mut() {
      *grid = HeightGrid::new(w, h);
    }
    self.composite = HeightGrid::new(w, h);
    self.mask.resize(w, h);
    debug!("Heightmap ripple grid reallocated to {w}x{h}");
    true
  }

  /// Replaces the dynamic obstruction footprint with world-space shapes on
  /// the `(x, z)` plane.
  pub fn set_dynamic_obstructions(&mut self, shapes: &[ObstructionShape]) -> ObstructionReport {
    if !self.mask.is_dynamic() {
      return ObstructionReport::default();
    }
    let origin = Vec2::new(self.left, self.water_z - self.params.surface_depth * 0.5);
    let ppu = self.params.pixels_per_unit;
    let cells: Vec<ObstructionShape> = shapes.iter().map(|s| s.to_cells(origin, ppu)).collect();
    let report = self.mask.rasterize(&cells);
    self.stats.dropped_obstructions += report.dropped as u64;
    report
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ripple() -> HeightmapRipple {
    HeightmapRipple::new(
      0.0,
      4.0,
      0.0,
      HeightmapParams::default(),
      SineWaves::default(),
      &ObstructionConfig::None,
    )
    .unwrap()
  }

  #[test]
  fn grid_matches_world_size() {
    let heightmap = ripple();
    assert_eq!(heightmap.size(), UVec2::new(32, 16));
    assert!(
      heightmap
        .final_grid()
        .cells()
        .iter()
        .all(|&c| c == NEUTRAL_HEIGHT)
    );
  }

  #[test]
  fn injection_is_bounded() {
    let mut heightmap = ripple();
    let accepted = (0..15)
      .filter(|_| heightmap.inject_ripple(Vec2::splat(0.5), 0.1, 5.0))
      .count();
    assert_eq!(accepted, MAX_RIPPLES_PER_TICK);
    assert_eq!(heightmap.dropped_ripples(), 5);

    for _ in 0..100 {
      heightmap.advance(1.0 / 60.0);
      assert!(
        heightmap
          .final_grid()
          .cells()
          .iter()
          .all(|&c| (0.0..=1.0).contains(&c))
      );
    }
    assert_eq!(heightmap.pending_ripples(), 0);
  }

  #[test]
  fn cells_outside_every_radius_stay_neutral() {
    let mut heightmap = ripple();
    heightmap.inject_ripple(Vec2::new(0.25, 0.5), 0.05, 0.3);
    heightmap.inject_ripple(Vec2::new(0.75, 0.5), 0.05, -0.3);
    heightmap.apply_pending_stamps();
    let grid = heightmap.current();
    assert_ne!(grid.get(8, 8), NEUTRAL_HEIGHT);
    assert!(grid.get(24, 8) < NEUTRAL_HEIGHT);
    assert_eq!(grid.get(0, 0), NEUTRAL_HEIGHT);
    assert_eq!(grid.get(16, 8), NEUTRAL_HEIGHT);
    assert_eq!(grid.get(31, 15), NEUTRAL_HEIGHT);
  }

  #[test]
  fn flood_of_stamps_stays_local() {
    let mut heightmap = ripple();
    let centres = [0.15, 0.3, 0.45, 0.6, 0.75, 0.9];
    let mut accepted = Vec::new();
    for round in 0..3 {
      for &u in &centres {
        let uv = Vec2::new(u, 0.25 + round as f32 * 0.25);
        if heightmap.inject_ripple(uv, 0.03, 0.2) {
          accepted.push(uv);
        }
      }
    }
    assert_eq!(accepted.len(), MAX_RIPPLES_PER_TICK);
    assert_eq!(heightmap.dropped_ripples(), 18 - MAX_RIPPLES_PER_TICK as u64);

    heightmap.apply_pending_stamps();
    assert_eq!(heightmap.pending_ripples(), 0);

    let grid = heightmap.current();
    let (w, h) = (grid.width() as f32, grid.height() as f32);
    let mut touched = 0;
    for y in 0..grid.height() {
      for x in 0..grid.width() {
        let cell = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        // Stamp radii are a fraction of the width, in cells.
        let inside = accepted
          .iter()
          .any(|uv| cell.distance(Vec2::new(uv.x * w, uv.y * h)) < 0.03 * w);
        let value = grid.get(x, y);
        assert!((0.0..=1.0).contains(&value));
        if inside {
          touched += usize::from(value != NEUTRAL_HEIGHT);
        } else {
          assert_eq!(value, NEUTRAL_HEIGHT, "cell ({x}, {y}) outside every stamp");
        }
      }
    }
    assert!(touched > 0);
  }

  #[test]
  fn profile_follows_the_centre_row() {
    let params = HeightmapParams {
      height_scale: 2.0,
      ..Default::default()
    };
    let mut heightmap = HeightmapRipple::new(
      0.0,
      4.0,
      0.0,
      params,
      SineWaves::default(),
      &ObstructionConfig::None,
    )
    .unwrap();
    let calm = heightmap.surface_profile(1.0);
    assert_eq!(calm.len(), 34);
    assert_eq!(calm.first().map(|p| p.x), Some(0.0));
    assert_eq!(calm.last().map(|p| p.x), Some(4.0));
    assert!(calm.iter().all(|p| p.y == 1.0));

    heightmap.inject_ripple(Vec2::splat(0.5), 0.1, 0.2);
    heightmap.advance(1.0 / 60.0);
    let profile = heightmap.surface_profile(1.0);
    let centre = profile[17];
    let expected = 1.0 + (heightmap.final_grid().get(16, 8) - NEUTRAL_HEIGHT) * 2.0;
    assert!(centre.y > 1.0);
    assert!((centre.y - expected).abs() < 1e-6);
    assert_eq!(profile[1].y, 1.0);
  }

  #[test]
  fn ripples_spread_and_decay() {
    let mut heightmap = ripple();
    heightmap.inject_ripple(Vec2::splat(0.5), 0.05, 0.4);
    heightmap.advance(1.0 / 60.0);
    let neighbour_after_one = heightmap.current().get(20, 8);
    for _ in 0..10 {
      heightmap.advance(1.0 / 60.0);
    }
    assert_eq!(neighbour_after_one, NEUTRAL_HEIGHT);
    assert_ne!(heightmap.current().get(20, 8), NEUTRAL_HEIGHT);

    for _ in 0..2000 {
      heightmap.advance(1.0 / 60.0);
    }
    let max_offset = heightmap
      .current()
      .cells()
      .iter()
      .map(|c| (c - NEUTRAL_HEIGHT).abs())
      .fold(0.0f32, f32::max);
    assert!(max_offset < 1e-3, "residual offset {max_offset}");
  }

  #[test]
  fn obstructed_cells_reject_stamps() {
    let mut heightmap = HeightmapRipple::new(
      0.0,
      4.0,
      0.0,
      HeightmapParams::default(),
      SineWaves::default(),
      &ObstructionConfig::Dynamic,
    )
    .unwrap();
    let report = heightmap.set_dynamic_obstructions(&[ObstructionShape::Box {
      center: Vec2::new(2.0, 0.0),
      half_extents: Vec2::splat(0.5),
    }]);
    assert_eq!(report.boxes, 1);

    heightmap.inject_ripple(Vec2::splat(0.5), 0.1, 0.4);
    for _ in 0..5 {
      heightmap.advance(1.0 / 60.0);
    }
    assert_eq!(heightmap.current().get(16, 8), NEUTRAL_HEIGHT);
    assert_eq!(heightmap.final_grid().get(16, 8), NEUTRAL_HEIGHT);
  }

  #[test]
  fn per_second_cadence_caps_catch_up() {
    let params = HeightmapParams {
      cadence: UpdateCadence::PerSecond { rate: 30.0 },
      ..Default::default()
    };
    let mut heightmap = HeightmapRipple::new(
      0.0,
      4.0,
      0.0,
      params,
      SineWaves::default(),
      &ObstructionConfig::None,
    )
    .unwrap();
    assert_eq!(heightmap.advance(1.0), DEFAULT_MAX_CATCH_UP_STEPS);
    assert_eq!(heightmap.stats().capped_advances, 1);
  }

  #[test]
  fn uv_follows_depth_axis() {
    let heightmap = ripple();
    assert_eq!(heightmap.world_to_uv(2.0, 0.0), Vec2::new(0.5, 0.5));
    assert_eq!(heightmap.world_to_uv(0.0, 0.5), Vec2::new(0.0, 0.75));
    assert_eq!(heightmap.world_to_uv(-3.0, 9.0), Vec2::new(0.0, 1.0));
  }

  #[test]
  fn resize_reallocates_to_neutral() {
    let mut heightmap = ripple();
    heightmap.inject_ripple(Vec2::splat(0.5), 0.1, 0.3);
    heightmap.advance(1.0 / 60.0);
    assert!(!heightmap.resize_world(1.0, 4.0, 0.0));
    assert!(heightmap.resize_world(0.0, 8.0, 0.0));
    assert_eq!(heightmap.size(), UVec2::new(64, 16));
    assert!(
      heightmap
        .current()
        .cells()
        .iter()
        .all(|&c| c == NEUTRAL_HEIGHT)
    );
  }
}
