//! Command for spawning water entities.

use bevy::prelude::*;

use super::DefaultWaterConfig;
use super::components::Water;
use crate::config::WaterConfig;
use crate::water::WaterBody;

/// Spawns a [`Water`] entity filling `rect` (floor at `rect.min.y`, resting
/// surface at `rect.max.y`).
///
/// Uses the plugin's default configuration unless overridden with
/// [`SpawnWater2d::with_config`]. Invalid setups are logged and nothing is
/// spawned.
///
/// # Example
/// ```ignore
/// fn setup(mut commands: Commands) {
///     commands.queue(SpawnWater2d::new(Rect::new(-10.0, -4.0, 10.0, 0.0)));
/// }
/// ```
pub struct SpawnWater2d {
  rect: Rect,
  config: Option<WaterConfig>,
}

impl SpawnWater2d {
  pub fn new(rect: Rect) -> Self {
    Self { rect, config: None }
  }

  pub fn with_config(mut self, config: WaterConfig) -> Self {
    self.config = Some(config);
    self
  }
}

impl bevy::ecs::system::Command for SpawnWater2d {
  fn apply(self, world: &mut World) {
    let config = self.config.unwrap_or_else(|| {
      world
        .get_resource::<DefaultWaterConfig>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
    });

    match WaterBody::new(self.rect, config) {
      Ok(body) => {
        let entity = world.spawn(Water::new(body)).id();
        info!(
          "Spawned water {entity} spanning {:?} to {:?}",
          self.rect.min, self.rect.max
        );
      }
      Err(e) => error!("Failed to set up water body: {e}"),
    }
  }
}
