//! Fixed-rate stepping for the heightmap.

use serde::{Deserialize, Serialize};

/// Sub-steps allowed in one `advance` call before the backlog is deferred.
pub const DEFAULT_MAX_CATCH_UP_STEPS: u32 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateCadence {
  /// One sub-step per host tick.
  #[default]
  EveryTick,
  /// `rate` sub-steps per simulated second, decoupled from the host tick.
  PerSecond { rate: f32 },
}

/// Accumulates elapsed time and turns it into sub-step counts.
#[derive(Clone, Debug, Default)]
pub struct CadenceClock {
  accumulator: f32,
}

impl CadenceClock {
  /// Sub-steps to run for `dt` seconds, at most `max_steps`.
  ///
  /// Time left over (including any backlog beyond the cap) carries into the
  /// next call.
  pub fn steps(&mut self, cadence: UpdateCadence, dt: f32, max_steps: u32) -> u32 {
    match cadence {
      UpdateCadence::EveryTick => 1,
      UpdateCadence::PerSecond { rate } => {
        if rate <= 0.0 || !rate.is_finite() {
          return 0;
        }
        self.accumulator += dt.max(0.0);
        // Tolerance keeps exact multiples of the interval from rounding down.
        let due = (self.accumulator * rate + 1e-4).floor() as u32;
        let run = due.min(max_steps);
        self.accumulator = (self.accumulator - run as f32 / rate).max(0.0);
        run
      }
    }
  }

  /// Unconsumed simulated time.
  pub fn backlog(&self) -> f32 {
    self.accumulator
  }
}
