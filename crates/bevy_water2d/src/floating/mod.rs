//! Registry of objects currently inside a water body's trigger volume.

mod adapter;

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use bevy::math::{Affine2, Rect, Vec2};

pub use adapter::{BodyAdapter, BodyState};

use crate::clip::ClipResult;
use crate::geometry::Shape;

bitflags::bitflags! {
  /// Per-submersion state. Effects fire at most once until the object
  /// leaves the water.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
  pub struct FloatingFlags: u8 {
    const SOUND_PLAYED = 1 << 0;
    const PARTICLES_SPAWNED = 1 << 1;
    /// Touched the surface on the previous tick.
    const IN_CONTACT = 1 << 2;
  }
}

/// Why an object left the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
  /// Left the trigger volume.
  LeftVolume,
  /// The backing body or collider is gone.
  Destroyed,
}

/// An object inside the water volume. Equality and hashing use only the key.
#[derive(Clone, Debug)]
pub struct FloatingObject<K> {
  key: K,
  pub shape: Shape,
  pub is_player: bool,
  pub previous_position: Option<Vec2>,
  pub previous_up: Option<Vec2>,
  pub flags: FloatingFlags,
  /// Submerged area from the last force pass.
  pub submerged_area: f32,
  /// Clip output for the remembered pose.
  clip: Option<ClipResult>,
}

impl<K: Copy> FloatingObject<K> {
  pub fn new(key: K, shape: Shape, is_player: bool) -> Self {
    Self {
      key,
      shape,
      is_player,
      previous_position: None,
      previous_up: None,
      flags: FloatingFlags::empty(),
      submerged_area: 0.0,
      clip: None,
    }
  }

  #[inline]
  pub fn key(&self) -> K {
    self.key
  }

  pub fn world_polygon(&self, transform: &Affine2, segments: usize) -> Vec<Vec2> {
    self.shape.to_world_polygon(transform, segments)
  }

  pub fn world_bounds(&self, transform: &Affine2, segments: usize) -> Rect {
    self.shape.world_bounds(transform, segments)
  }

  /// Clears the once-per-submersion flags.
  pub fn mark_surfaced(&mut self) {
    self.flags = FloatingFlags::empty();
    self.submerged_area = 0.0;
  }

  /// Stores this tick's pose for next tick's motion queries.
  pub fn remember(&mut self, state: &BodyState) {
    self.previous_position = Some(state.position());
    self.previous_up = Some(state.up());
  }

  /// True if `state` is within `epsilon` of the remembered pose, in both
  /// position and up direction.
  pub fn is_at_previous_pose(&self, state: &BodyState, epsilon: f32) -> bool {
    let (Some(position), Some(up)) = (self.previous_position, self.previous_up) else {
      return false;
    };
    position.distance(state.position()) <= epsilon && up.distance(state.up()) <= epsilon
  }

  /// Last clip output, if the object has not moved since it was computed.
  pub fn cached_clip(&self, state: &BodyState, epsilon: f32) -> Option<&ClipResult> {
    self
      .clip
      .as_ref()
      .filter(|_| self.is_at_previous_pose(state, epsilon))
  }

  pub fn store_clip(&mut self, clip: ClipResult) {
    self.clip = Some(clip);
  }

  pub fn invalidate_clip(&mut self) {
    self.clip = None;
  }
}

impl<K: PartialEq> PartialEq for FloatingObject<K> {
  fn eq(&self, other: &Self) -> bool {
    self.key == other.key
  }
}

impl<K: Eq> Eq for FloatingObject<K> {}

impl<K: Hash> Hash for FloatingObject<K> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.key.hash(state);
  }
}

/// Active floating objects, deduplicated by key.
#[derive(Clone, Debug)]
pub struct FloatingRegistry<K> {
  objects: HashMap<K, FloatingObject<K>>,
}

impl<K> Default for FloatingRegistry<K> {
  fn default() -> Self {
    Self {
      objects: HashMap::new(),
    }
  }
}

impl<K: Copy + Eq + Hash> FloatingRegistry<K> {
  /// Registers `key`. Returns false if it was already present, in which
  /// case the existing entry is kept.
  pub fn enter(&mut self, key: K, shape: Shape, is_player: bool) -> bool {
    if self.objects.contains_key(&key) {
      return false;
    }
    self
      .objects
      .insert(key, FloatingObject::new(key, shape, is_player));
    true
  }

  pub fn exit(&mut self, key: K) -> Option<FloatingObject<K>> {
    self.objects.remove(&key)
  }

  pub fn contains(&self, key: K) -> bool {
    self.objects.contains_key(&key)
  }

  pub fn get(&self, key: K) -> Option<&FloatingObject<K>> {
    self.objects.get(&key)
  }

  pub fn get_mut(&mut self, key: K) -> Option<&mut FloatingObject<K>> {
    self.objects.get_mut(&key)
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
    self.objects.keys().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = &FloatingObject<K>> {
    self.objects.values()
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FloatingObject<K>> {
    self.objects.values_mut()
  }

  /// Drops every entry whose body is gone; returns the removed keys.
  pub fn retain_alive(&mut self, mut is_alive: impl FnMut(K) -> bool) -> Vec<K> {
    let dead: Vec<K> = self.objects.keys().copied().filter(|&k| !is_alive(k)).collect();
    for key in &dead {
      self.objects.remove(key);
    }
    dead
  }

  /// Makes the registry match the set of objects overlapping the volume.
  ///
  /// Duplicate keys in `present` (several colliders of one object) register
  /// once. Returns `(entered, exited)`.
  pub fn sync(&mut self, present: impl IntoIterator<Item = (K, Shape, bool)>) -> (Vec<K>, Vec<K>) {
    let mut seen = HashSet::new();
    let mut entered = Vec::new();
    for (key, shape, is_player) in present {
      if !seen.insert(key) {
        continue;
      }
      if self.enter(key, shape, is_player) {
        entered.push(key);
      }
    }
    let exited: Vec<K> = self
      .objects
      .keys()
      .copied()
      .filter(|k| !seen.contains(k))
      .collect();
    for key in &exited {
      self.objects.remove(key);
    }
    (entered, exited)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn crate_shape() -> Shape {
    Shape::rectangle(1.0, 1.0)
  }

  #[test]
  fn enter_is_deduplicated() {
    let mut registry = FloatingRegistry::default();
    assert!(registry.enter(7u32, crate_shape(), false));
    assert!(!registry.enter(7u32, Shape::circle(3.0), true));
    assert_eq!(registry.len(), 1);
    assert!(!registry.get(7).unwrap().is_player);
  }

  #[test]
  fn sync_registers_multi_collider_object_once() {
    let mut registry = FloatingRegistry::default();
    let (entered, exited) = registry.sync([
      (1u32, crate_shape(), false),
      (1u32, Shape::circle(0.5), false),
      (2u32, crate_shape(), true),
    ]);
    assert_eq!(registry.len(), 2);
    assert_eq!(entered.len(), 2);
    assert!(exited.is_empty());

    let (entered, exited) = registry.sync([(2u32, crate_shape(), true)]);
    assert!(entered.is_empty());
    assert_eq!(exited, vec![1]);
    assert!(!registry.contains(1));
  }

  #[test]
  fn dead_bodies_are_pruned() {
    let mut registry = FloatingRegistry::default();
    registry.enter(1u32, crate_shape(), false);
    registry.enter(2u32, crate_shape(), false);
    let removed = registry.retain_alive(|k| k != 2);
    assert_eq!(removed, vec![2]);
    assert!(registry.contains(1));
    assert!(registry.exit(2).is_none());
  }

  #[test]
  fn clip_is_reused_only_at_the_remembered_pose() {
    let mut object = FloatingObject::new(1u32, crate_shape(), false);
    let here = BodyState::at_rest(Affine2::from_translation(Vec2::new(1.0, 0.0)));
    assert!(!object.is_at_previous_pose(&here, 1e-3));

    object.remember(&here);
    object.store_clip(ClipResult::whole(&[Vec2::ZERO, Vec2::X, Vec2::ONE]));
    assert!(object.cached_clip(&here, 1e-3).is_some());

    let moved = BodyState::at_rest(Affine2::from_translation(Vec2::new(1.5, 0.0)));
    assert!(object.cached_clip(&moved, 1e-3).is_none());
    let turned = BodyState::at_rest(Affine2::from_angle_translation(0.3, Vec2::new(1.0, 0.0)));
    assert!(object.cached_clip(&turned, 1e-3).is_none());

    object.invalidate_clip();
    assert!(object.cached_clip(&here, 1e-3).is_none());
  }

  #[test]
  fn identity_is_the_key() {
    let a = FloatingObject::new(3u32, crate_shape(), false);
    let mut b = FloatingObject::new(3u32, Shape::circle(1.0), true);
    b.flags.insert(FloatingFlags::SOUND_PLAYED);
    assert_eq!(a, b);
    b.mark_surfaced();
    assert!(b.flags.is_empty());
  }
}
