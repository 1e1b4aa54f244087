//! Geometry primitives: polygon math and collider silhouettes.

pub mod polygon;
pub mod shape;

pub use polygon::{
  AREA_EPSILON, bounds, cross_2d, edges, ensure_ccw, is_counter_clockwise,
  polygon_area, polygon_area_and_centroid, signed_area,
};
pub use shape::Shape;
