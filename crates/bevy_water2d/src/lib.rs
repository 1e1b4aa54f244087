//! Water2D - 2D water surfaces and buoyancy for Bevy.
//!
//! A water body is an axis-aligned rectangle whose top edge is simulated
//! either as a chain of damped springs or as a 2D heightmap ripple field.
//! Floating objects are clipped against the simulated waterline every fixed
//! tick and receive buoyancy, drag, lift and flow forces computed from the
//! submerged part of their silhouette.
//!
//! The simulation core ([`water::WaterBody`]) is engine-agnostic and reaches
//! rigid bodies only through [`floating::BodyAdapter`]. [`plugin`] wires it
//! into Bevy's ECS.

pub mod buoyancy;
pub mod clip;
pub mod config;
pub mod floating;
pub mod geometry;
pub mod plugin;
pub mod ripple;
pub mod surface;
#[cfg(feature = "tracy")]
mod tracy_init;
pub mod water;

pub use buoyancy::{BuoyancyMethod, BuoyancyParams};
pub use clip::{ClipMethod, ClipResult, SubmergedPolygon, WaterLine};
pub use config::{ConfigError, SurfaceMode, WaterConfig};
pub use floating::{BodyAdapter, BodyState, ExitReason, FloatingObject, FloatingRegistry};
pub use geometry::Shape;
pub use plugin::{
  DefaultWaterConfig, EnteredWater, ExitedWater, Floating, FloatingVelocity, RippleRequest,
  RippleSource, SpawnWater2d, SplashEffect, Splashed, Submersion, Water, Water2dPlugin,
  WaterForces, WaterObstruction, WaterSystems,
};
pub use ripple::{HeightmapRipple, ObstructionConfig, ObstructionMask};
pub use surface::{SineWaves, SpringSurface};
#[cfg(feature = "tracy")]
pub use tracy_init::init_tracy;
pub use water::{SetupError, TickReport, WaterBody, WaterEvent};

pub mod prelude {
  pub use crate::geometry::Shape;
  pub use crate::plugin::{
    EnteredWater, ExitedWater, Floating, FloatingVelocity, RippleRequest, RippleSource,
    SpawnWater2d, Splashed, Submersion, Water, Water2dPlugin, WaterForces, WaterObstruction,
  };
  pub use crate::{ClipMethod, SurfaceMode, WaterConfig};
}
