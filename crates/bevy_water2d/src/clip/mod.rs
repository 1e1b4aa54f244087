//! Submerged-polygon extraction.
//!
//! Two strategies clip an object's world-space silhouette against the water:
//!
//! - [`clip_against_line`]: a single Sutherland–Hodgman pass against a
//!   half-plane. Cheap; treats the surface under the object as a straight
//!   line.
//! - [`clip_against_band`]: exact polygon/polygon intersection against the
//!   sampled waterline closed at the water floor, on a fixed-point grid.
//!
//! "No intersection" is a normal outcome and is reported through
//! [`ClipResult::intersects`], never as an error.

mod band;
mod line;
mod waterline;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

pub use band::{DEFAULT_CLIP_PRECISION, clip_against_band};
pub use line::clip_against_line;
pub use waterline::WaterLine;

use crate::geometry::{AREA_EPSILON, polygon_area_and_centroid};

/// Which clipping strategy computes submerged geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMethod {
  /// Half-plane clip against the surface line under the object.
  #[default]
  Simple,
  /// Exact clip against the sampled waterline band.
  Complex,
}

/// One submerged piece with its area and centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmergedPolygon {
  /// Counter-clockwise vertices.
  pub points: Vec<Vec2>,
  pub area: f32,
  pub centroid: Vec2,
}

impl SubmergedPolygon {
  pub fn new(points: Vec<Vec2>) -> Self {
    let (area, centroid) = polygon_area_and_centroid(&points);
    Self {
      points,
      area,
      centroid,
    }
  }
}

/// Output of a clip: zero or more disjoint submerged pieces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipResult {
  pub pieces: Vec<SubmergedPolygon>,
  pub intersects: bool,
}

impl ClipResult {
  /// The empty-result sentinel.
  pub fn none() -> Self {
    Self::default()
  }

  /// The subject lies fully in the water.
  pub fn whole(subject: &[Vec2]) -> Self {
    Self::from_pieces(vec![subject.to_vec()])
  }

  /// Builds a result, discarding pieces with no area.
  pub fn from_pieces(pieces: Vec<Vec<Vec2>>) -> Self {
    let pieces: Vec<SubmergedPolygon> = pieces
      .into_iter()
      .filter(|p| p.len() >= 3)
      .map(SubmergedPolygon::new)
      .filter(|p| p.area > AREA_EPSILON)
      .collect();
    Self {
      intersects: !pieces.is_empty(),
      pieces,
    }
  }

  /// Total submerged area.
  pub fn area(&self) -> f32 {
    self.pieces.iter().map(|p| p.area).sum()
  }

  /// Area-weighted centroid of all pieces, or `None` when nothing is
  /// submerged.
  pub fn centroid(&self) -> Option<Vec2> {
    let area = self.area();
    if area <= AREA_EPSILON {
      return None;
    }
    let weighted: Vec2 = self.pieces.iter().map(|p| p.centroid * p.area).sum();
    Some(weighted / area)
  }
}
