//! Height grids and the ping-pong pair that owns them.

use bevy::math::Vec2;

/// Resting value of a normalized height cell.
pub const NEUTRAL_HEIGHT: f32 = 0.5;

/// Row-major grid of normalized heights in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
  width: usize,
  height: usize,
  cells: Vec<f32>,
}

impl HeightGrid {
  /// Creates a grid with every cell at [`NEUTRAL_HEIGHT`].
  pub fn new(width: usize, height: usize) -> Self {
    let width = width.max(1);
    let height = height.max(1);
    Self {
      width,
      height,
      cells: vec![NEUTRAL_HEIGHT; width * height],
    }
  }

  #[inline]
  pub fn width(&self) -> usize {
    self.width
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.height
  }

  #[inline]
  pub fn index(&self, x: usize, y: usize) -> usize {
    y * self.width + x
  }

  #[inline]
  pub fn get(&self, x: usize, y: usize) -> f32 {
    self.cells[self.index(x, y)]
  }

  #[inline]
  pub fn set(&mut self, x: usize, y: usize, value: f32) {
    let idx = self.index(x, y);
    self.cells[idx] = value;
  }

  /// Offset from neutral at signed coordinates; outside the grid is calm.
  #[inline]
  pub fn offset_at(&self, x: isize, y: isize) -> f32 {
    if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
      return 0.0;
    }
    self.get(x as usize, y as usize) - NEUTRAL_HEIGHT
  }

  pub fn cells(&self) -> &[f32] {
    &self.cells
  }

  pub fn cells_mut(&mut self) -> &mut [f32] {
    &mut self.cells
  }

  /// Nearest-cell lookup at normalized coordinates, clamped to the edges.
  pub fn sample(&self, uv: Vec2) -> f32 {
    let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
    let x = ((uv.x * self.width as f32) as usize).min(self.width - 1);
    let y = ((uv.y * self.height as f32) as usize).min(self.height - 1);
    self.get(x, y)
  }
}

/// Double buffer with a swappable "current" slot.
#[derive(Clone, Debug)]
pub struct PingPong<T> {
  buffers: [T; 2],
  current: usize,
}

impl<T> PingPong<T> {
  pub fn new(current: T, previous: T) -> Self {
    Self {
      buffers: [current, previous],
      current: 0,
    }
  }

  pub fn current(&self) -> &T {
    &self.buffers[self.current]
  }

  pub fn previous(&self) -> &T {
    &self.buffers[1 - self.current]
  }

  pub fn current_mut(&mut self) -> &mut T {
    &mut self.buffers[self.current]
  }

  /// Mutable access to both slots as `(current, previous)`.
  pub fn split_mut(&mut self) -> (&mut T, &mut T) {
    let (first, second) = self.buffers.split_at_mut(1);
    if self.current == 0 {
      (&mut first[0], &mut second[0])
    } else {
      (&mut second[0], &mut first[0])
    }
  }

  /// Makes the previous slot current.
  pub fn swap(&mut self) {
    self.current = 1 - self.current;
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
    self.buffers.iter_mut()
  }
}

impl<T: Clone> PingPong<T> {
  /// Both slots start as copies of `value`.
  pub fn splat(value: T) -> Self {
    Self::new(value.clone(), value)
  }
}
