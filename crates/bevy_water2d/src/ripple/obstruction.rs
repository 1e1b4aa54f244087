//! Obstruction mask: cells where ripples neither form nor propagate.

use std::fmt;
use std::path::{Path, PathBuf};

use bevy::log::debug;
use bevy::math::{Rect, Vec2};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Shape;

/// Live box colliders rasterized per update; extras are dropped.
pub const MAX_DYNAMIC_BOXES: usize = 5;
/// Live circle colliders rasterized per update; extras are dropped.
pub const MAX_DYNAMIC_CIRCLES: usize = 5;

/// Luma at or below this counts as black (obstructed).
const OBSTRUCTED_LUMA: u8 = 127;

/// Where obstruction data comes from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ObstructionConfig {
  #[default]
  None,
  /// Rasterized from live box/circle colliders each tick.
  Dynamic,
  /// Loaded once from an image; black = obstructed.
  Static { path: PathBuf },
}

/// A live collider footprint on the water plane.
///
/// Built in world units; [`ObstructionMask::rasterize`] expects grid-cell
/// units, see [`ObstructionShape::to_cells`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObstructionShape {
  Box { center: Vec2, half_extents: Vec2 },
  Circle { center: Vec2, radius: f32 },
}

impl ObstructionShape {
  /// Footprint of `shape` centred at `center`, if the shape is a box or a
  /// circle. Rotation is ignored.
  pub fn from_shape(shape: &Shape, center: Vec2) -> Option<Self> {
    match *shape {
      Shape::Box { half_extents } => Some(Self::Box {
        center,
        half_extents,
      }),
      Shape::Circle { radius } => Some(Self::Circle { center, radius }),
      Shape::Capsule { .. } | Shape::Polygon { .. } => None,
    }
  }

  /// Maps a world-space footprint into cells of a grid whose cell (0, 0)
  /// corner sits at `origin`, with `cells_per_unit` cells per world unit.
  pub fn to_cells(self, origin: Vec2, cells_per_unit: f32) -> Self {
    match self {
      ObstructionShape::Box {
        center,
        half_extents,
      } => ObstructionShape::Box {
        center: (center - origin) * cells_per_unit,
        half_extents: half_extents * cells_per_unit,
      },
      ObstructionShape::Circle { center, radius } => ObstructionShape::Circle {
        center: (center - origin) * cells_per_unit,
        radius: radius * cells_per_unit,
      },
    }
  }
}

/// How many dynamic obstructions were rasterized and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObstructionReport {
  pub boxes: usize,
  pub circles: usize,
  pub dropped: usize,
}

#[derive(Debug)]
pub enum ObstructionError {
  /// The image could not be opened or decoded.
  Image {
    path: PathBuf,
    source: image::ImageError,
  },
  /// The image has a zero dimension.
  Empty { path: PathBuf },
}

impl fmt::Display for ObstructionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ObstructionError::Image { path, source } => {
        write!(f, "failed to load obstruction texture {}: {source}", path.display())
      }
      ObstructionError::Empty { path } => {
        write!(f, "obstruction texture {} is empty", path.display())
      }
    }
  }
}

impl std::error::Error for ObstructionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ObstructionError::Image { source, .. } => Some(source),
      ObstructionError::Empty { .. } => None,
    }
  }
}

#[derive(Clone, Debug)]
enum MaskSource {
  None,
  Dynamic,
  Static(GrayImage),
}

/// Per-cell obstruction flags at heightmap resolution.
#[derive(Clone, Debug)]
pub struct ObstructionMask {
  source: MaskSource,
  width: usize,
  height: usize,
  blocked: Vec<bool>,
}

impl ObstructionMask {
  /// A mask that blocks nothing.
  pub fn none(width: usize, height: usize) -> Self {
    Self::with_source(MaskSource::None, width, height)
  }

  /// A mask fed by [`ObstructionMask::rasterize`].
  pub fn dynamic(width: usize, height: usize) -> Self {
    Self::with_source(MaskSource::Dynamic, width, height)
  }

  /// A mask resampled from `image` (nearest neighbour).
  pub fn from_image(image: GrayImage, width: usize, height: usize) -> Self {
    let mut mask = Self::with_source(MaskSource::Static(image), width, height);
    mask.resample();
    mask
  }

  /// Loads a static mask from an image file.
  pub fn load(path: &Path, width: usize, height: usize) -> Result<Self, ObstructionError> {
    let image = image::open(path)
      .map_err(|source| ObstructionError::Image {
        path: path.to_path_buf(),
        source,
      })?
      .to_luma8();
    if image.width() == 0 || image.height() == 0 {
      return Err(ObstructionError::Empty {
        path: path.to_path_buf(),
      });
    }
    debug!(
      "Loaded obstruction texture {} ({}x{})",
      path.display(),
      image.width(),
      image.height()
    );
    Ok(Self::from_image(image, width, height))
  }

  /// Builds the mask described by `config`.
  pub fn from_config(
    config: &ObstructionConfig,
    width: usize,
    height: usize,
  ) -> Result<Self, ObstructionError> {
    match config {
      ObstructionConfig::None => Ok(Self::none(width, height)),
      ObstructionConfig::Dynamic => Ok(Self::dynamic(width, height)),
      ObstructionConfig::Static { path } => Self::load(path, width, height),
    }
  }

  fn with_source(source: MaskSource, width: usize, height: usize) -> Self {
    let width = width.max(1);
    let height = height.max(1);
    Self {
      source,
      width,
      height,
      blocked: vec![false; width * height],
    }
  }

  pub fn is_dynamic(&self) -> bool {
    matches!(self.source, MaskSource::Dynamic)
  }

  #[inline]
  pub fn is_blocked(&self, x: usize, y: usize) -> bool {
    self.blocked[y * self.width + x]
  }

  pub fn blocked_count(&self) -> usize {
    self.blocked.iter().filter(|&&b| b).count()
  }

  /// Matches the heightmap resolution. Static masks are resampled, dynamic
  /// masks are cleared until the next rasterize.
  pub fn resize(&mut self, width: usize, height: usize) {
    self.width = width.max(1);
    self.height = height.max(1);
    self.blocked = vec![false; self.width * self.height];
    self.resample();
  }

  fn resample(&mut self) {
    let MaskSource::Static(image) = &self.source else {
      return;
    };
    let (iw, ih) = image.dimensions();
    for y in 0..self.height {
      let sy = ((y as u64 * ih as u64) / self.height as u64) as u32;
      for x in 0..self.width {
        let sx = ((x as u64 * iw as u64) / self.width as u64) as u32;
        let luma = image.get_pixel(sx.min(iw - 1), sy.min(ih - 1)).0[0];
        self.blocked[y * self.width + x] = luma <= OBSTRUCTED_LUMA;
      }
    }
  }

  /// Replaces the dynamic footprint with `shapes`. At most
  /// [`MAX_DYNAMIC_BOXES`] boxes and [`MAX_DYNAMIC_CIRCLES`] circles are
  /// kept; the rest are dropped and counted. No-op for other sources.
  pub fn rasterize(&mut self, shapes: &[ObstructionShape]) -> ObstructionReport {
    let mut report = ObstructionReport::default();
    if !self.is_dynamic() {
      return report;
    }
    self.blocked.fill(false);

    for shape in shapes {
      let accepted = match shape {
        ObstructionShape::Box { .. } if report.boxes < MAX_DYNAMIC_BOXES => {
          report.boxes += 1;
          true
        }
        ObstructionShape::Circle { .. } if report.circles < MAX_DYNAMIC_CIRCLES => {
          report.circles += 1;
          true
        }
        _ => false,
      };
      if !accepted {
        report.dropped += 1;
        continue;
      }
      self.fill_shape(shape);
    }

    if report.dropped > 0 {
      debug!(
        "Dropped {} dynamic obstructions over the {}+{} cap",
        report.dropped, MAX_DYNAMIC_BOXES, MAX_DYNAMIC_CIRCLES
      );
    }
    report
  }

  fn fill_shape(&mut self, shape: &ObstructionShape) {
    let area = match *shape {
      ObstructionShape::Box {
        center,
        half_extents,
      } => Rect::from_center_half_size(center, half_extents.abs()),
      ObstructionShape::Circle { center, radius } => {
        Rect::from_center_half_size(center, Vec2::splat(radius.abs()))
      }
    };
    let x0 = area.min.x.floor().max(0.0) as usize;
    let y0 = area.min.y.floor().max(0.0) as usize;
    let x1 = (area.max.x.ceil().max(0.0) as usize).min(self.width);
    let y1 = (area.max.y.ceil().max(0.0) as usize).min(self.height);

    for y in y0..y1 {
      for x in x0..x1 {
        let cell_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let inside = match *shape {
          ObstructionShape::Box { .. } => area.contains(cell_center),
          ObstructionShape::Circle { center, radius } => {
            cell_center.distance_squared(center) <= radius * radius
          }
        };
        if inside {
          self.blocked[y * self.width + x] = true;
        }
      }
    }
  }
}
