//! A single body of water: surface simulation, floating-object registry and
//! force computation, advanced together one fixed tick at a time.
//!
//! Tick order:
//!
//! 1. drop registry entries whose bodies are gone,
//! 2. snapshot every remaining body,
//! 3. turn object impacts, rain and queued ripple requests into surface
//!    disturbances,
//! 4. advance the active surface simulation,
//! 5. resample the waterline from the spring chain or the heightmap,
//! 6. clip each object against the new waterline and compute its forces
//!    (in parallel), then apply them through the [`BodyAdapter`] in order.

mod diagnostics;
mod rain;

use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;

use bevy::log::debug;
use bevy::math::{Rect, Vec2};
use rayon::prelude::*;

pub use diagnostics::WaterDiagnostics;
pub use rain::Rain;

use crate::buoyancy::{
  BuoyancyMethod, BuoyancyParams, LinearForces, PhysicsForces, linear_forces, physics_based_forces,
};
use crate::clip::{ClipMethod, ClipResult, WaterLine, clip_against_band, clip_against_line};
use crate::config::{ConfigError, SurfaceMode, WaterConfig};
use crate::floating::{
  BodyAdapter, BodyState, ExitReason, FloatingFlags, FloatingObject, FloatingRegistry,
};
use crate::geometry::Shape;
use crate::ripple::{HeightmapRipple, ObstructionError, ObstructionReport, ObstructionShape};
use crate::surface::{DisturbMode, SpringSurface};

/// Why a water body could not be created.
#[derive(Debug)]
pub enum SetupError {
  /// The water rectangle has a non-positive or non-finite extent.
  InvalidDimensions { width: f32, height: f32 },
  Config(ConfigError),
  Obstruction(ObstructionError),
}

impl fmt::Display for SetupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidDimensions { width, height } => {
        write!(f, "invalid water dimensions {width} x {height}")
      }
      Self::Config(e) => write!(f, "{e}"),
      Self::Obstruction(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for SetupError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::InvalidDimensions { .. } => None,
      Self::Config(e) => Some(e),
      Self::Obstruction(e) => Some(e),
    }
  }
}

impl From<ConfigError> for SetupError {
  fn from(err: ConfigError) -> Self {
    Self::Config(err)
  }
}

impl From<ObstructionError> for SetupError {
  fn from(err: ObstructionError) -> Self {
    Self::Obstruction(err)
  }
}

/// A fast first contact with the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splash<K> {
  pub key: K,
  /// Where the object met the surface.
  pub position: Vec2,
  /// Vertical entry speed.
  pub speed: f32,
  /// False when a sound already played during this submersion.
  pub play_sound: bool,
  /// False when particles already spawned during this submersion.
  pub spawn_particles: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaterEvent<K> {
  Entered { key: K },
  Exited { key: K, reason: ExitReason },
  Splashed(Splash<K>),
}

/// Net effect of one tick's forces on one object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceSummary {
  pub force: Vec2,
  /// Torque about the centre of mass.
  pub torque: f32,
  pub submerged_area: f32,
}

/// What happened during [`WaterBody::tick`].
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport<K> {
  pub events: Vec<WaterEvent<K>>,
  pub forces: Vec<(K, ForceSummary)>,
  pub heightmap_steps: u32,
  pub waterline_rebuilt: bool,
}

impl<K> Default for TickReport<K> {
  fn default() -> Self {
    Self {
      events: Vec::new(),
      forces: Vec::new(),
      heightmap_steps: 0,
      waterline_rebuilt: false,
    }
  }
}

#[derive(Clone, Copy, Debug)]
struct Disturbance {
  /// World X and plane depth Z.
  position: Vec2,
  radius: f32,
  /// Surface velocity for the spring chain.
  velocity: f32,
  /// Stamp strength for the heightmap.
  strength: f32,
  mode: DisturbMode,
}

enum ComputedForces {
  None,
  Physics(PhysicsForces),
  Linear(LinearForces),
}

struct ObjectResult<K> {
  key: K,
  forces: ComputedForces,
  submerged_area: f32,
  center_of_mass: Vec2,
  /// Freshly computed clip; `None` when the cached one was reused.
  clip: Option<ClipResult>,
}

/// Surface, registry and per-tick force pipeline for one water rectangle.
pub struct WaterBody<K> {
  config: WaterConfig,
  /// World rectangle: floor at `min.y`, resting waterline at `max.y`.
  rect: Rect,
  spring: SpringSurface,
  heightmap: Option<HeightmapRipple>,
  waterline: WaterLine,
  registry: FloatingRegistry<K>,
  rain: Rain,
  pending: Vec<Disturbance>,
  events: Vec<WaterEvent<K>>,
  time: f32,
  diagnostics: WaterDiagnostics,
}

impl<K: Copy + Eq + Hash + Send + Sync> WaterBody<K> {
  /// Creates calm water filling `rect`.
  pub fn new(rect: Rect, config: WaterConfig) -> Result<Self, SetupError> {
    let size = rect.size();
    if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
      return Err(SetupError::InvalidDimensions {
        width: size.x,
        height: size.y,
      });
    }
    config.validate()?;

    let spring = SpringSurface::new(rect.min.x, size.x, rect.max.y, config.surface.spring.clone());
    let heightmap = match config.surface.mode {
      SurfaceMode::Spring => None,
      SurfaceMode::Heightmap => Some(HeightmapRipple::new(
        rect.min.x,
        size.x,
        0.0,
        config.surface.heightmap.clone(),
        config.surface.waves.clone(),
        &config.obstruction,
      )?),
    };

    let waterline = WaterLine::new(
      config.clipping.waterline_stride,
      config.clipping.waterline_epsilon,
    );

    let diagnostics = WaterDiagnostics {
      resolution_clamped: spring.resolution_clamped(),
      ..Default::default()
    };
    debug!(
      "Water body {}x{} at ({}, {}), {} surface vertices",
      size.x,
      size.y,
      rect.min.x,
      rect.min.y,
      spring.vertices().len()
    );

    let mut body = Self {
      rain: Rain::new(config.rain.seed),
      config,
      rect,
      spring,
      heightmap,
      waterline,
      registry: FloatingRegistry::default(),
      pending: Vec::new(),
      events: Vec::new(),
      time: 0.0,
      diagnostics,
    };
    let boundary = body.boundary_profile();
    body.waterline.update(&boundary);
    Ok(body)
  }

  pub fn config(&self) -> &WaterConfig {
    &self.config
  }

  pub fn rect(&self) -> Rect {
    self.rect
  }

  pub fn spring(&self) -> &SpringSurface {
    &self.spring
  }

  pub fn heightmap(&self) -> Option<&HeightmapRipple> {
    self.heightmap.as_ref()
  }

  pub fn waterline(&self) -> &WaterLine {
    &self.waterline
  }

  pub fn registry(&self) -> &FloatingRegistry<K> {
    &self.registry
  }

  pub fn diagnostics(&self) -> WaterDiagnostics {
    self.diagnostics
  }

  pub fn time(&self) -> f32 {
    self.time
  }

  /// Published top edge for rendering, left to right.
  pub fn surface_points(&self) -> Vec<Vec2> {
    self
      .spring
      .surface_points(&self.config.surface.waves, self.time)
  }

  /// Surface the clip boundary is sampled from: the spring chain, or the
  /// heightmap's centre row in heightmap mode.
  fn boundary_profile(&self) -> Vec<Vec2> {
    match &self.heightmap {
      Some(heightmap) => heightmap.surface_profile(self.rect.max.y),
      None => self.surface_points(),
    }
  }

  /// Current surface height at world `x`.
  pub fn surface_height_at(&self, x: f32) -> f32 {
    self.waterline.height_at(x).unwrap_or(self.rect.max.y)
  }

  /// The trigger volume: the water rectangle plus a margin above the
  /// resting waterline.
  pub fn trigger_volume(&self) -> Rect {
    let mut volume = self.rect;
    volume.max.y += self.config.interaction.trigger_margin.max(0.0);
    volume
  }

  /// True if `bounds` overlaps the trigger volume.
  pub fn overlaps(&self, bounds: Rect) -> bool {
    !self.trigger_volume().intersect(bounds).is_empty()
  }

  /// Registers an object that entered the trigger volume. Returns false if
  /// it was already registered.
  pub fn enter(&mut self, key: K, shape: Shape, is_player: bool) -> bool {
    let entered = self.registry.enter(key, shape, is_player);
    if entered {
      self.events.push(WaterEvent::Entered { key });
    }
    entered
  }

  /// Unregisters an object that left the trigger volume.
  pub fn exit(&mut self, key: K) -> bool {
    let exited = self.registry.exit(key).is_some();
    if exited {
      self.events.push(WaterEvent::Exited {
        key,
        reason: ExitReason::LeftVolume,
      });
    }
    exited
  }

  /// Replaces the registered set with the objects currently overlapping the
  /// trigger volume. Several colliders of one object register it once.
  pub fn sync_contacts(&mut self, present: impl IntoIterator<Item = (K, Shape, bool)>) {
    let (entered, exited) = self.registry.sync(present);
    self
      .events
      .extend(entered.into_iter().map(|key| WaterEvent::Entered { key }));
    self.events.extend(exited.into_iter().map(|key| WaterEvent::Exited {
      key,
      reason: ExitReason::LeftVolume,
    }));
  }

  /// Drops objects whose bodies no longer exist and reports them as
  /// destroyed. Returns how many were dropped.
  pub fn remove_destroyed(&mut self, is_alive: impl FnMut(K) -> bool) -> usize {
    let destroyed = self.registry.retain_alive(is_alive);
    for &key in &destroyed {
      self.report_destroyed(key);
    }
    destroyed.len()
  }

  fn report_destroyed(&mut self, key: K) {
    self.diagnostics.destroyed_bodies += 1;
    self.events.push(WaterEvent::Exited {
      key,
      reason: ExitReason::Destroyed,
    });
  }

  /// Queues a ripple applied at the start of the next tick.
  ///
  /// `position` is world X and depth Z on the water plane (Z = 0 is the
  /// plane's centre line; the spring surface ignores it). `strength` is the
  /// surface velocity added to the spring chain and the stamp strength for
  /// the heightmap.
  pub fn generate_ripple_at_position(&mut self, position: Vec2, radius: f32, strength: f32) {
    self.pending.push(Disturbance {
      position,
      radius,
      velocity: strength,
      strength,
      mode: DisturbMode::Add,
    });
  }

  /// Replaces the dynamic obstruction footprint. Only has an effect with a
  /// heightmap surface and a dynamic obstruction source.
  pub fn set_dynamic_obstructions(&mut self, shapes: &[ObstructionShape]) -> ObstructionReport {
    let Some(heightmap) = self.heightmap.as_mut() else {
      return ObstructionReport::default();
    };
    let report = heightmap.set_dynamic_obstructions(shapes);
    self.diagnostics.dropped_obstructions = heightmap.stats().dropped_obstructions;
    report
  }

  /// Moves or resizes the water, keeping surface offsets.
  pub fn set_rect(&mut self, rect: Rect) -> Result<(), SetupError> {
    let size = rect.size();
    if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
      return Err(SetupError::InvalidDimensions {
        width: size.x,
        height: size.y,
      });
    }
    if rect == self.rect {
      return Ok(());
    }
    self.rect = rect;
    for object in self.registry.iter_mut() {
      object.invalidate_clip();
    }
    self.spring.set_left(rect.min.x);
    self.spring.set_waterline(rect.max.y);
    let spu = self.config.surface.spring.segments_per_unit;
    self.diagnostics.resolution_clamped = self.spring.resize(size.x, spu);
    if let Some(heightmap) = self.heightmap.as_mut() {
      heightmap.resize_world(rect.min.x, size.x, 0.0);
    }
    Ok(())
  }

  /// Advances one fixed tick of `dt` seconds and applies forces through
  /// `bodies`.
  #[cfg_attr(feature = "tracy", tracing::instrument(skip_all, name = "water_tick"))]
  pub fn tick<B>(&mut self, dt: f32, bodies: &mut B) -> TickReport<K>
  where
    B: BodyAdapter<Key = K>,
  {
    let mut report = TickReport::default();

    self.remove_destroyed(|key| bodies.is_alive(key));
    let mut snapshots = Vec::with_capacity(self.registry.len());
    let mut vanished = Vec::new();
    for key in self.registry.keys() {
      match bodies.state(key) {
        Some(state) => snapshots.push((key, state)),
        None => vanished.push(key),
      }
    }
    for key in vanished {
      self.registry.exit(key);
      self.report_destroyed(key);
    }

    self.collect_impacts(&snapshots);
    self.collect_rain(dt);
    self.apply_disturbances();

    report.heightmap_steps = self.advance_surface(dt);
    self.time += dt;

    let boundary = self.boundary_profile();
    report.waterline_rebuilt = self.waterline.update(&boundary);
    if report.waterline_rebuilt {
      self.diagnostics.waterline_rebuilds += 1;
    }

    let results = self.compute_forces(&snapshots, report.waterline_rebuilt);
    report.forces = self.apply_forces(results, &snapshots, bodies);

    self.diagnostics.ticks += 1;
    report.events = std::mem::take(&mut self.events);
    report
  }

  /// Turns waterline crossings into surface disturbances and splashes.
  fn collect_impacts(&mut self, snapshots: &[(K, BodyState)]) {
    let interaction = self.config.interaction.clone();
    let segments = self.config.clipping.curve_segments;

    for (key, state) in snapshots {
      let Some(object) = self.registry.get(*key) else {
        continue;
      };
      let bounds = object.world_bounds(&state.transform, segments);
      let center_x = bounds.center().x;
      let surface_y = self.waterline.height_at(center_x).unwrap_or(self.rect.max.y);
      let in_contact = bounds.min.y < surface_y;
      let speed = state.linear_velocity.y;
      let mut flags = object.flags;

      if in_contact && speed.abs() > interaction.impact_velocity_threshold {
        let radius = bounds.half_size().x * interaction.impact_radius_scale;
        let max = interaction.max_impact_velocity.abs();
        self.pending.push(Disturbance {
          position: Vec2::new(center_x, 0.0),
          radius,
          velocity: (speed * interaction.impact_velocity_scale).clamp(-max, max),
          strength: speed * interaction.ripple_strength_scale,
          mode: DisturbMode::Set,
        });
      }

      if in_contact
        && !flags.contains(FloatingFlags::IN_CONTACT)
        && speed.abs() > interaction.splash_velocity_threshold
      {
        self.events.push(WaterEvent::Splashed(Splash {
          key: *key,
          position: Vec2::new(center_x, surface_y),
          speed: speed.abs(),
          play_sound: !flags.contains(FloatingFlags::SOUND_PLAYED),
          spawn_particles: !flags.contains(FloatingFlags::PARTICLES_SPAWNED),
        }));
        flags.insert(FloatingFlags::SOUND_PLAYED | FloatingFlags::PARTICLES_SPAWNED);
      }

      if let Some(object) = self.registry.get_mut(*key) {
        if in_contact {
          object.flags = flags | FloatingFlags::IN_CONTACT;
        } else {
          object.mark_surfaced();
        }
      }
    }
  }

  fn collect_rain(&mut self, dt: f32) {
    let rain = &self.config.rain;
    if !rain.enabled {
      return;
    }
    let depth = self.config.surface.heightmap.surface_depth * 0.5;
    let drops = self.rain.drops(
      rain,
      dt,
      (self.rect.min.x, self.rect.max.x),
      (-depth, depth),
    );
    self.pending.extend(drops.into_iter().map(|position| Disturbance {
      position,
      radius: rain.drop_radius,
      velocity: rain.drop_velocity,
      strength: rain.drop_strength,
      mode: DisturbMode::Add,
    }));
  }

  fn apply_disturbances(&mut self) {
    for disturbance in self.pending.drain(..) {
      match self.heightmap.as_mut() {
        Some(heightmap) => {
          let uv = heightmap.world_to_uv(disturbance.position.x, disturbance.position.y);
          let radius = heightmap.world_radius_to_uv(disturbance.radius);
          heightmap.inject_ripple(uv, radius, disturbance.strength);
        }
        None => {
          self.spring.disturb(
            disturbance.position.x,
            disturbance.radius,
            disturbance.velocity,
            disturbance.mode,
          );
        }
      }
    }
  }

  fn advance_surface(&mut self, dt: f32) -> u32 {
    match self.heightmap.as_mut() {
      Some(heightmap) => {
        let steps = heightmap.advance(dt);
        let stats = heightmap.stats();
        self.diagnostics.heightmap_sub_steps = stats.sub_steps;
        self.diagnostics.capped_catch_up = stats.capped_advances;
        self.diagnostics.dropped_ripples = heightmap.dropped_ripples();
        steps
      }
      None => {
        self.spring.step();
        0
      }
    }
  }

  fn compute_forces(
    &self,
    snapshots: &[(K, BodyState)],
    waterline_rebuilt: bool,
  ) -> Vec<ObjectResult<K>> {
    let inputs: Vec<(&FloatingObject<K>, &BodyState)> = snapshots
      .iter()
      .filter_map(|(key, state)| self.registry.get(*key).map(|object| (object, state)))
      .collect();

    inputs
      .par_iter()
      .map(|(object, state)| self.object_forces(object, state, waterline_rebuilt))
      .collect()
  }

  fn object_forces(
    &self,
    object: &FloatingObject<K>,
    state: &BodyState,
    waterline_rebuilt: bool,
  ) -> ObjectResult<K> {
    let clipping = &self.config.clipping;
    let cached = if waterline_rebuilt {
      None
    } else {
      object.cached_clip(state, clipping.waterline_epsilon)
    };
    let submerged = match cached {
      Some(clip) => Cow::Borrowed(clip),
      None => {
        let polygon = object.world_polygon(&state.transform, clipping.curve_segments);
        Cow::Owned(self.clip(&polygon))
      }
    };
    let params: &BuoyancyParams = &self.config.buoyancy;
    let multiplier = params.multiplier(object.is_player);

    let forces = match params.method {
      BuoyancyMethod::PhysicsBased if submerged.intersects => {
        let mut forces =
          physics_based_forces(&submerged.pieces, |p| -state.point_velocity(p), params);
        forces.scale(multiplier);
        ComputedForces::Physics(forces)
      }
      BuoyancyMethod::PhysicsBased => ComputedForces::None,
      BuoyancyMethod::Linear => {
        let com = state.center_of_mass;
        let height = com.y - self.surface_height_at(com.x);
        let mut forces = linear_forces(
          height,
          state.linear_velocity,
          state.angular_velocity,
          params,
        );
        forces.scale(multiplier);
        ComputedForces::Linear(forces)
      }
    };

    ObjectResult {
      key: object.key(),
      forces,
      submerged_area: submerged.area(),
      center_of_mass: state.center_of_mass,
      clip: match submerged {
        Cow::Owned(clip) => Some(clip),
        Cow::Borrowed(_) => None,
      },
    }
  }

  fn clip(&self, polygon: &[Vec2]) -> ClipResult {
    if polygon.len() < 3 {
      return ClipResult::none();
    }
    match self.config.clipping.method {
      ClipMethod::Simple => {
        let bounds = crate::geometry::bounds(polygon);
        let x0 = bounds.min.x;
        let x1 = bounds.max.x.max(x0 + 1e-3);
        let p0 = Vec2::new(x0, self.surface_height_at(x0));
        let p1 = Vec2::new(x1, self.surface_height_at(x1));
        let below_surface = clip_against_line(polygon, p0, p1);
        if bounds.min.x >= self.rect.min.x
          && bounds.max.x <= self.rect.max.x
          && bounds.min.y >= self.rect.min.y
        {
          below_surface
        } else {
          self.confine_to_basin(below_surface)
        }
      }
      ClipMethod::Complex => clip_against_band(
        polygon,
        self.waterline.points(),
        self.rect.min.y,
        self.config.clipping.precision,
      ),
    }
  }

  /// Cuts clip output at the floor and both side walls of the water.
  fn confine_to_basin(&self, clip: ClipResult) -> ClipResult {
    let Rect { min, max } = self.rect;
    // Each directed wall keeps the half-plane on its right: floor kept
    // above, left wall kept right of it, right wall kept left of it.
    let walls = [
      (Vec2::new(max.x, min.y), Vec2::new(min.x, min.y)),
      (Vec2::new(min.x, min.y), Vec2::new(min.x, max.y)),
      (Vec2::new(max.x, max.y), Vec2::new(max.x, min.y)),
    ];
    let pieces = clip
      .pieces
      .into_iter()
      .filter_map(|piece| {
        let mut points = piece.points;
        for (p0, p1) in walls {
          let mut result = clip_against_line(&points, p0, p1);
          points = result.pieces.pop()?.points;
        }
        Some(points)
      })
      .collect();
    ClipResult::from_pieces(pieces)
  }

  fn apply_forces<B>(
    &mut self,
    results: Vec<ObjectResult<K>>,
    snapshots: &[(K, BodyState)],
    bodies: &mut B,
  ) -> Vec<(K, ForceSummary)>
  where
    B: BodyAdapter<Key = K>,
  {
    let mut summaries = Vec::with_capacity(results.len());
    for result in results {
      let summary = match &result.forces {
        ComputedForces::None => ForceSummary::default(),
        ComputedForces::Physics(forces) => {
          for point in forces.point_forces() {
            bodies.apply_force_at_point(result.key, point.force, point.point);
          }
          ForceSummary {
            force: forces.total_force(),
            torque: forces.torque_about(result.center_of_mass),
            submerged_area: forces.submerged_area,
          }
        }
        ComputedForces::Linear(forces) => {
          let total = forces.total();
          if total != Vec2::ZERO {
            bodies.apply_force_at_point(result.key, total, result.center_of_mass);
          }
          if forces.torque != 0.0 {
            bodies.apply_torque(result.key, forces.torque);
          }
          ForceSummary {
            force: total,
            torque: forces.torque,
            submerged_area: result.submerged_area,
          }
        }
      };

      match result.clip {
        Some(clip) => {
          if let Some(object) = self.registry.get_mut(result.key) {
            object.store_clip(clip);
          }
        }
        None => self.diagnostics.reused_clips += 1,
      }
      if let Some(object) = self.registry.get_mut(result.key) {
        object.submerged_area = result.submerged_area;
      }
      summaries.push((result.key, summary));
    }

    for (key, state) in snapshots {
      if let Some(object) = self.registry.get_mut(*key) {
        object.remember(state);
      }
    }

    summaries
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use bevy::math::Affine2;

  use super::*;
  use crate::buoyancy::BuoyancyMethod;

  /// Bodies that only record what they receive.
  #[derive(Default)]
  struct RecordingBodies {
    states: HashMap<u32, BodyState>,
    forces: HashMap<u32, Vec2>,
    torques: HashMap<u32, f32>,
  }

  impl RecordingBodies {
    fn place(&mut self, key: u32, position: Vec2, velocity: Vec2) {
      self.states.insert(
        key,
        BodyState {
          linear_velocity: velocity,
          ..BodyState::at_rest(Affine2::from_translation(position))
        },
      );
    }
  }

  impl BodyAdapter for RecordingBodies {
    type Key = u32;

    fn is_alive(&self, key: u32) -> bool {
      self.states.contains_key(&key)
    }

    fn state(&self, key: u32) -> Option<BodyState> {
      self.states.get(&key).copied()
    }

    fn apply_force_at_point(&mut self, key: u32, force: Vec2, _point: Vec2) {
      *self.forces.entry(key).or_default() += force;
    }

    fn apply_torque(&mut self, key: u32, torque: f32) {
      *self.torques.entry(key).or_default() += torque;
    }
  }

  fn pool(config: WaterConfig) -> WaterBody<u32> {
    WaterBody::new(
      Rect::from_corners(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 0.0)),
      config,
    )
    .unwrap()
  }

  #[test]
  fn rejects_degenerate_rect() {
    let result = WaterBody::<u32>::new(Rect::new(0.0, 0.0, 0.0, 1.0), WaterConfig::default());
    assert!(matches!(result, Err(SetupError::InvalidDimensions { .. })));
  }

  #[test]
  fn rejects_invalid_config() {
    let mut config = WaterConfig::default();
    config.clipping.waterline_stride = 0;
    let result = WaterBody::<u32>::new(Rect::new(0.0, 0.0, 1.0, 1.0), config);
    assert!(matches!(result, Err(SetupError::Config(_))));
  }

  #[test]
  fn missing_obstruction_texture_fails_setup() {
    let mut config = WaterConfig::default();
    config.surface.mode = SurfaceMode::Heightmap;
    config.obstruction = crate::ripple::ObstructionConfig::Static {
      path: "no/such/mask.png".into(),
    };
    let result = WaterBody::<u32>::new(Rect::new(0.0, 0.0, 4.0, 1.0), config);
    assert!(matches!(result, Err(SetupError::Obstruction(_))));
  }

  #[test]
  fn half_submerged_box_gets_buoyancy() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::ZERO, Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);

    let report = water.tick(1.0 / 60.0, &mut bodies);
    let (_, summary) = report.forces[0];
    assert!((summary.submerged_area - 1.0).abs() < 1e-3);
    assert!((summary.force.y - 9.8).abs() < 1e-2);
    assert!((bodies.forces[&1].y - 9.8).abs() < 1e-2);
  }

  #[test]
  fn complex_clip_matches_simple_on_flat_water() {
    let mut config = WaterConfig::default();
    config.clipping.method = ClipMethod::Complex;
    let mut water = pool(config);
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::new(3.0, 0.0), Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);

    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert!((report.forces[0].1.submerged_area - 1.0).abs() < 1e-3);
  }

  #[test]
  fn resting_object_reuses_its_clip() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::ZERO, Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);

    let first = water.tick(1.0 / 60.0, &mut bodies);
    let second = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(water.diagnostics().reused_clips, 1);
    assert_eq!(first.forces, second.forces);

    bodies.place(1, Vec2::new(0.0, -0.25), Vec2::ZERO);
    let moved = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(water.diagnostics().reused_clips, 1);
    assert!((moved.forces[0].1.submerged_area - 1.5).abs() < 1e-3);
  }

  #[test]
  fn simple_clip_stops_at_the_pool_walls() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    // Straddles the left wall at x = -10.
    bodies.place(1, Vec2::new(-10.0, 0.0), Vec2::ZERO);
    // Rests on the floor at y = -5, lower half below it.
    bodies.place(2, Vec2::new(4.0, -5.0), Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);
    water.enter(2, Shape::rectangle(2.0, 1.0), false);

    let report = water.tick(1.0 / 60.0, &mut bodies);
    let area = |key| {
      report
        .forces
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, summary)| summary.submerged_area)
        .unwrap()
    };
    assert!((area(1) - 0.5).abs() < 1e-3);
    assert!((area(2) - 1.0).abs() < 1e-3);
    assert!((bodies.forces[&1].y - 4.9).abs() < 1e-2);
  }

  #[test]
  fn destroyed_body_is_removed() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::ZERO, Vec2::ZERO);
    water.enter(1, Shape::circle(0.5), false);
    water.tick(1.0 / 60.0, &mut bodies);

    bodies.states.remove(&1);
    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert!(report.events.contains(&WaterEvent::Exited {
      key: 1,
      reason: ExitReason::Destroyed,
    }));
    assert!(water.registry().is_empty());
    assert!(report.forces.is_empty());
    assert_eq!(water.diagnostics().destroyed_bodies, 1);
  }

  #[test]
  fn remove_destroyed_reports_each_body() {
    let mut water = pool(WaterConfig::default());
    water.enter(1, Shape::circle(0.5), false);
    water.enter(2, Shape::circle(0.5), false);
    assert_eq!(water.remove_destroyed(|key| key == 1), 1);
    assert!(water.registry().contains(1));
    assert!(!water.registry().contains(2));
    assert_eq!(water.diagnostics().destroyed_bodies, 1);
  }

  #[test]
  fn fast_entry_splashes_once() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::new(0.0, 0.2), Vec2::new(0.0, -5.0));
    water.enter(1, Shape::rectangle(1.0, 1.0), false);

    let first = water.tick(1.0 / 60.0, &mut bodies);
    let splashes: Vec<_> = first
      .events
      .iter()
      .filter_map(|e| match e {
        WaterEvent::Splashed(splash) => Some(*splash),
        _ => None,
      })
      .collect();
    assert_eq!(splashes.len(), 1);
    assert!(splashes[0].play_sound && splashes[0].spawn_particles);

    let second = water.tick(1.0 / 60.0, &mut bodies);
    assert!(
      !second
        .events
        .iter()
        .any(|e| matches!(e, WaterEvent::Splashed(_)))
    );
    // The impact disturbed the surface under the object.
    assert!(water.spring().kinetic_energy() > 0.0);
  }

  #[test]
  fn objects_above_water_feel_nothing() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::new(0.0, 3.0), Vec2::ZERO);
    water.enter(1, Shape::rectangle(1.0, 1.0), false);
    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(report.forces[0].1, ForceSummary::default());
    assert!(!bodies.forces.contains_key(&1));
  }

  #[test]
  fn player_forces_are_scaled() {
    let mut config = WaterConfig::default();
    config.buoyancy.player_force_multiplier = 2.0;
    let mut water = pool(config);
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::new(-4.0, 0.0), Vec2::ZERO);
    bodies.place(2, Vec2::new(4.0, 0.0), Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);
    water.enter(2, Shape::rectangle(2.0, 1.0), true);

    water.tick(1.0 / 60.0, &mut bodies);
    let ratio = bodies.forces[&2].y / bodies.forces[&1].y;
    assert!((ratio - 2.0).abs() < 1e-3);
  }

  #[test]
  fn linear_method_lifts_and_damps_spin() {
    let mut config = WaterConfig::default();
    config.buoyancy.method = BuoyancyMethod::Linear;
    let mut water = pool(config);
    let mut bodies = RecordingBodies::default();
    bodies.states.insert(
      1,
      BodyState {
        angular_velocity: 1.0,
        ..BodyState::at_rest(Affine2::from_translation(Vec2::new(0.0, -0.5)))
      },
    );
    water.enter(1, Shape::circle(0.5), false);
    water.tick(1.0 / 60.0, &mut bodies);
    assert!(bodies.forces[&1].y > 9.8);
    assert!(bodies.torques[&1] < 0.0);
  }

  #[test]
  fn ripple_requests_reach_the_surface() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    water.generate_ripple_at_position(Vec2::new(2.0, 0.0), 0.5, -0.3);
    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert!(report.waterline_rebuilt);
    assert!(water.surface_height_at(2.0) < 0.0);
  }

  #[test]
  fn heightmap_caps_ripples_per_tick() {
    let mut config = WaterConfig::default();
    config.surface.mode = SurfaceMode::Heightmap;
    let mut water = pool(config);
    let mut bodies = RecordingBodies::default();
    for _ in 0..12 {
      water.generate_ripple_at_position(Vec2::new(0.0, 0.0), 1.0, 0.02);
    }
    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(report.heightmap_steps, 1);
    assert_eq!(water.diagnostics().dropped_ripples, 2);
    let heightmap = water.heightmap().unwrap();
    assert!(heightmap.current().sample(Vec2::splat(0.5)) != crate::ripple::NEUTRAL_HEIGHT);
  }

  #[test]
  fn heightmap_ripple_raises_the_clip_boundary() {
    let mut config = WaterConfig::default();
    config.surface.mode = SurfaceMode::Heightmap;
    config.clipping.method = ClipMethod::Complex;
    let mut water = pool(config);
    let mut bodies = RecordingBodies::default();
    bodies.place(1, Vec2::ZERO, Vec2::ZERO);
    water.enter(1, Shape::rectangle(2.0, 1.0), false);

    let calm = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(water.surface_height_at(0.0), 0.0);
    assert!((calm.forces[0].1.submerged_area - 1.0).abs() < 1e-3);

    water.generate_ripple_at_position(Vec2::ZERO, 1.0, 0.1);
    let rippled = water.tick(1.0 / 60.0, &mut bodies);
    assert!(rippled.waterline_rebuilt);
    assert!(water.surface_height_at(0.0) > 0.05);
    assert!(rippled.forces[0].1.submerged_area > 1.05);
  }

  #[test]
  fn sync_reports_enter_and_exit() {
    let mut water = pool(WaterConfig::default());
    let mut bodies = RecordingBodies::default();
    water.sync_contacts([(1, Shape::circle(1.0), false), (1, Shape::circle(1.0), false)]);
    water.sync_contacts([(2, Shape::circle(1.0), false)]);
    let report = water.tick(1.0 / 60.0, &mut bodies);
    assert_eq!(
      report.events,
      vec![
        WaterEvent::Entered { key: 1 },
        WaterEvent::Entered { key: 2 },
        WaterEvent::Exited {
          key: 1,
          reason: ExitReason::LeftVolume
        },
        // Body 2 has no state in the adapter.
        WaterEvent::Exited {
          key: 2,
          reason: ExitReason::Destroyed
        },
      ]
    );
  }

  #[test]
  fn trigger_volume_extends_above_surface() {
    let water = pool(WaterConfig::default());
    assert!(water.overlaps(Rect::new(0.0, 0.2, 1.0, 0.4)));
    assert!(!water.overlaps(Rect::new(0.0, 2.0, 1.0, 3.0)));
  }
}
