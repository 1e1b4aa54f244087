//! Counters for work done and limits hit.

/// Running totals for one water body. Every truncation the simulation
/// performs instead of failing is counted here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaterDiagnostics {
  pub ticks: u64,
  pub heightmap_sub_steps: u64,
  pub waterline_rebuilds: u64,
  /// Force passes that reused a clip because neither the object nor the
  /// waterline moved.
  pub reused_clips: u64,
  /// Ripple stamps dropped by the per-tick cap.
  pub dropped_ripples: u64,
  /// Dynamic obstructions dropped by the per-kind cap.
  pub dropped_obstructions: u64,
  /// Heightmap `advance` calls that hit the catch-up cap.
  pub capped_catch_up: u64,
  /// Objects removed because their body disappeared.
  pub destroyed_bodies: u64,
  /// Surface resolution was lowered to respect the vertex cap.
  pub resolution_clamped: bool,
}
