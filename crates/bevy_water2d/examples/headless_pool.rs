//! Drops a few objects into a pool without Bevy's ECS and prints how they
//! settle.
//!
//! Bodies are integrated with semi-implicit Euler behind a [`BodyAdapter`].
//! Pass a TOML file to override the default water configuration:
//!
//! ```text
//! cargo run -p bevy_water2d --example headless_pool -- water.toml
//! ```

use std::collections::HashMap;

use bevy::math::{Affine2, Rect, Vec2};
use bevy_water2d::{BodyAdapter, BodyState, Shape, WaterBody, WaterConfig, WaterEvent};

const DT: f32 = 1.0 / 60.0;

struct Body {
  position: Vec2,
  angle: f32,
  velocity: Vec2,
  angular_velocity: f32,
  mass: f32,
  inertia: f32,
  force: Vec2,
  torque: f32,
}

impl Body {
  fn new(position: Vec2, mass: f32) -> Self {
    Self {
      position,
      angle: 0.0,
      velocity: Vec2::ZERO,
      angular_velocity: 0.0,
      mass,
      inertia: mass * 0.5,
      force: Vec2::ZERO,
      torque: 0.0,
    }
  }

  fn integrate(&mut self, gravity: Vec2, dt: f32) {
    self.velocity += (gravity + self.force / self.mass) * dt;
    self.angular_velocity += self.torque / self.inertia * dt;
    self.position += self.velocity * dt;
    self.angle += self.angular_velocity * dt;
    self.force = Vec2::ZERO;
    self.torque = 0.0;
  }
}

#[derive(Default)]
struct Bodies(HashMap<u32, Body>);

impl BodyAdapter for Bodies {
  type Key = u32;

  fn is_alive(&self, key: u32) -> bool {
    self.0.contains_key(&key)
  }

  fn state(&self, key: u32) -> Option<BodyState> {
    let body = self.0.get(&key)?;
    Some(BodyState {
      transform: Affine2::from_angle_translation(body.angle, body.position),
      linear_velocity: body.velocity,
      angular_velocity: body.angular_velocity,
      center_of_mass: body.position,
    })
  }

  fn apply_force_at_point(&mut self, key: u32, force: Vec2, point: Vec2) {
    if let Some(body) = self.0.get_mut(&key) {
      body.force += force;
      body.torque += (point - body.position).perp_dot(force);
    }
  }

  fn apply_torque(&mut self, key: u32, torque: f32) {
    if let Some(body) = self.0.get_mut(&key) {
      body.torque += torque;
    }
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = match std::env::args().nth(1) {
    Some(path) => WaterConfig::load(path)?,
    None => WaterConfig::default(),
  };
  let gravity = config.buoyancy.gravity();
  let mut water = WaterBody::new(Rect::new(-10.0, -6.0, 10.0, 0.0), config)?;

  let shapes = [
    (Shape::rectangle(2.0, 0.6), Vec2::new(-5.0, 3.0), 0.5),
    (Shape::circle(0.5), Vec2::new(0.0, 2.0), 0.4),
    (Shape::capsule(0.6, 0.3), Vec2::new(5.0, 4.0), 0.3),
  ];
  let mut bodies = Bodies::default();
  for (key, (_, position, mass)) in (0u32..).zip(&shapes) {
    bodies.0.insert(key, Body::new(*position, *mass));
  }

  for tick in 0..600 {
    let present: Vec<_> = (0u32..)
      .zip(&shapes)
      .filter_map(|(key, (shape, _, _))| {
        let state = bodies.state(key)?;
        let bounds = shape.world_bounds(&state.transform, 16);
        water
          .overlaps(bounds)
          .then(|| (key, shape.clone(), false))
      })
      .collect();
    water.sync_contacts(present);

    let report = water.tick(DT, &mut bodies);
    for event in &report.events {
      match event {
        WaterEvent::Entered { key } => println!("[{tick:>3}] body {key} entered"),
        WaterEvent::Exited { key, reason } => {
          println!("[{tick:>3}] body {key} exited ({reason:?})")
        }
        WaterEvent::Splashed(splash) => println!(
          "[{tick:>3}] body {} splashed at {:.2} speed {:.2}",
          splash.key, splash.position, splash.speed
        ),
      }
    }

    for body in bodies.0.values_mut() {
      body.integrate(gravity, DT);
    }

    if tick % 120 == 0 {
      let mut keys: Vec<_> = bodies.0.keys().copied().collect();
      keys.sort_unstable();
      for key in keys {
        let body = &bodies.0[&key];
        println!(
          "[{tick:>3}] body {key}: y {:+.3} vy {:+.3}",
          body.position.y, body.velocity.y
        );
      }
    }
  }

  let diagnostics = water.diagnostics();
  println!(
    "{} ticks, {} waterline rebuilds",
    diagnostics.ticks, diagnostics.waterline_rebuilds
  );
  Ok(())
}
