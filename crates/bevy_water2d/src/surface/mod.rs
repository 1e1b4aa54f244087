//! Top-edge surface simulation.

mod spring;
mod waves;

pub use spring::{DisturbMode, MAX_SURFACE_VERTICES, SpringParams, SpringSurface, SurfaceVertex};
pub use waves::SineWaves;
