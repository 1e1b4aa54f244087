//! Fixed-tick systems driving every [`Water`] entity.

use bevy::ecs::entity::Entities;
use bevy::prelude::*;

use super::bodies::{EcsBodies, FloatingBodies, planar_affine};
use super::components::{
  Floating, RippleSource, SplashEffect, Submersion, Water, WaterForces, WaterObstruction,
};
use super::messages::{EnteredWater, ExitedWater, RippleRequest, Splashed};
use crate::ripple::ObstructionShape;
use crate::water::WaterEvent;

/// Forces are accumulated per tick; clear last tick's totals first.
pub fn reset_water_forces(mut forces: Query<&mut WaterForces>) {
  for mut forces in forces.iter_mut() {
    *forces = WaterForces::default();
  }
}

pub fn emit_ripple_sources(
  time: Res<Time>,
  mut sources: Query<(&GlobalTransform, &mut RippleSource)>,
  mut requests: MessageWriter<RippleRequest>,
) {
  for (transform, mut source) in sources.iter_mut() {
    source.timer.tick(time.delta());
    let translation = transform.translation();
    let position = Vec2::new(translation.x, translation.z);
    for _ in 0..source.timer.times_finished_this_tick() {
      requests.write(RippleRequest::at(position, source.radius, source.strength));
    }
  }
}

/// Routes ripple requests to their target water, or to every water whose
/// horizontal span contains the request.
pub fn apply_ripple_requests(
  mut requests: MessageReader<RippleRequest>,
  mut waters: Query<(Entity, &mut Water)>,
) {
  for request in requests.read() {
    if let Some(target) = request.water {
      match waters.get_mut(target) {
        Ok((_, mut water)) => {
          water
            .body_mut()
            .generate_ripple_at_position(request.position, request.radius, request.strength);
        }
        Err(_) => debug!("Ripple request for missing water {target}"),
      }
      continue;
    }

    for (_, mut water) in waters.iter_mut() {
      let rect = water.body().rect();
      if (rect.min.x..=rect.max.x).contains(&request.position.x) {
        water
          .body_mut()
          .generate_ripple_at_position(request.position, request.radius, request.strength);
      }
    }
  }
}

/// Rasterizes live obstruction colliders into heightmap waters.
pub fn update_dynamic_obstructions(
  obstructions: Query<(&WaterObstruction, &GlobalTransform)>,
  mut waters: Query<&mut Water>,
) {
  let shapes: Vec<ObstructionShape> = obstructions
    .iter()
    .filter_map(|(obstruction, transform)| {
      let translation = transform.translation();
      ObstructionShape::from_shape(
        &obstruction.shape,
        Vec2::new(translation.x, translation.z),
      )
    })
    .collect();

  for mut water in waters.iter_mut() {
    let body = water.body_mut();
    if body.heightmap().is_some_and(|h| h.mask().is_dynamic()) {
      body.set_dynamic_obstructions(&shapes);
    }
  }
}

/// Registers floating objects whose silhouettes overlap each trigger volume.
///
/// Despawned entities are reported as destroyed rather than as leaving.
pub fn sync_water_contacts(
  entities: &Entities,
  floating: Query<(Entity, &Floating, &GlobalTransform)>,
  mut waters: Query<&mut Water>,
) {
  for mut water in waters.iter_mut() {
    let body = water.body_mut();
    body.remove_destroyed(|entity| entities.contains(entity));
    let segments = body.config().clipping.curve_segments;
    let present: Vec<_> = floating
      .iter()
      .filter(|(_, object, transform)| {
        body.overlaps(object.shape.world_bounds(&planar_affine(transform), segments))
      })
      .map(|(entity, object, _)| (entity, object.shape.clone(), object.is_player))
      .collect();
    body.sync_contacts(present);
  }
}

#[allow(clippy::too_many_arguments)]
pub fn tick_water(
  mut commands: Commands,
  time: Res<Time>,
  mut waters: Query<(Entity, &mut Water)>,
  mut bodies: FloatingBodies,
  mut submersions: Query<&mut Submersion>,
  mut entered: MessageWriter<EnteredWater>,
  mut exited: MessageWriter<ExitedWater>,
  mut splashed: MessageWriter<Splashed>,
) {
  let dt = time.delta_secs();
  if dt <= 0.0 {
    return;
  }

  for (water_entity, mut water) in waters.iter_mut() {
    let body = water.body_mut();
    let splash_lifetime = body.config().interaction.splash_lifetime;
    let report = body.tick(dt, &mut EcsBodies { query: &mut bodies });

    for event in report.events {
      match event {
        WaterEvent::Entered { key } => {
          if let Ok(mut submersion) = submersions.get_mut(key) {
            submersion.water = Some(water_entity);
          }
          entered.write(EnteredWater {
            water: water_entity,
            entity: key,
          });
        }
        WaterEvent::Exited { key, reason } => {
          if let Ok(mut submersion) = submersions.get_mut(key)
            && submersion.water == Some(water_entity)
          {
            *submersion = Submersion::default();
          }
          exited.write(ExitedWater {
            water: water_entity,
            entity: key,
            reason,
          });
        }
        WaterEvent::Splashed(splash) => {
          if splash.spawn_particles {
            commands.spawn((
              SplashEffect::new(splash_lifetime, splash.key),
              Transform::from_translation(splash.position.extend(0.0)),
            ));
          }
          splashed.write(Splashed {
            water: water_entity,
            entity: splash.key,
            position: splash.position,
            speed: splash.speed,
            play_sound: splash.play_sound,
            spawn_particles: splash.spawn_particles,
          });
        }
      }
    }

    for (key, summary) in report.forces {
      if let Ok(mut submersion) = submersions.get_mut(key) {
        submersion.water = Some(water_entity);
        submersion.submerged_area = summary.submerged_area;
      }
    }
  }
}

pub fn expire_splash_effects(
  mut commands: Commands,
  time: Res<Time>,
  mut effects: Query<(Entity, &mut SplashEffect)>,
) {
  for (entity, mut effect) in effects.iter_mut() {
    effect.timer.tick(time.delta());
    if effect.timer.just_finished() {
      commands.entity(entity).despawn();
    }
  }
}
