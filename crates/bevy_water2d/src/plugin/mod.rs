//! Bevy integration.
//!
//! # Usage
//!
//! ```ignore
//! use bevy_water2d::prelude::*;
//!
//! app.add_plugins(Water2dPlugin::default());
//!
//! fn setup(mut commands: Commands) {
//!     commands.queue(SpawnWater2d::new(Rect::new(-10.0, -4.0, 10.0, 0.0)));
//!     commands.spawn((Floating::new(Shape::rectangle(1.0, 1.0)), Transform::default()));
//! }
//! ```
//!
//! Water runs in `FixedUpdate`. Hosts without a physics backend write
//! [`FloatingVelocity`] and integrate [`WaterForces`] themselves; with the
//! `rapier2d` feature both are bridged to rapier components.

mod bodies;
mod components;
mod messages;
#[cfg(physics)]
mod rapier;
mod spawn;
mod systems;

use bevy::prelude::*;
pub use components::{
  Floating, FloatingVelocity, RippleSource, SplashEffect, Submersion, Water, WaterForces,
  WaterObstruction,
};
pub use messages::{EnteredWater, ExitedWater, RippleRequest, Splashed};
pub use spawn::SpawnWater2d;

use crate::config::WaterConfig;

/// Ordering of the fixed-tick water systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaterSystems {
  /// Reads velocities, ripple requests, obstructions and contacts.
  Prepare,
  /// Ticks every water body.
  Simulate,
  /// Hands the resulting forces to the physics backend.
  Apply,
}

/// Configuration used by [`SpawnWater2d`] when none is given.
#[derive(Resource, Clone, Debug, Default)]
pub struct DefaultWaterConfig(pub WaterConfig);

/// Adds water simulation, buoyancy and its messages to an app.
#[derive(Default)]
pub struct Water2dPlugin {
  pub config: WaterConfig,
}

impl Water2dPlugin {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: WaterConfig) -> Self {
    Self { config }
  }
}

impl Plugin for Water2dPlugin {
  fn build(&self, app: &mut App) {
    app
      .insert_resource(DefaultWaterConfig(self.config.clone()))
      .add_message::<EnteredWater>()
      .add_message::<ExitedWater>()
      .add_message::<Splashed>()
      .add_message::<RippleRequest>();

    app.configure_sets(
      FixedUpdate,
      (
        WaterSystems::Prepare,
        WaterSystems::Simulate,
        WaterSystems::Apply,
      )
        .chain(),
    );

    app.add_systems(
      FixedUpdate,
      (
        systems::reset_water_forces,
        systems::emit_ripple_sources,
        systems::apply_ripple_requests,
        systems::update_dynamic_obstructions,
        systems::sync_water_contacts,
      )
        .chain()
        .in_set(WaterSystems::Prepare),
    );
    app.add_systems(
      FixedUpdate,
      systems::tick_water.in_set(WaterSystems::Simulate),
    );

    #[cfg(physics)]
    {
      app.add_systems(
        FixedUpdate,
        rapier::sync_rapier_velocity
          .before(systems::reset_water_forces)
          .in_set(WaterSystems::Prepare),
      );
      app.add_systems(
        FixedUpdate,
        rapier::apply_rapier_forces.in_set(WaterSystems::Apply),
      );
    }

    app.add_systems(Update, systems::expire_splash_effects);
  }
}
