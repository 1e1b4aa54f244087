//! TOML-backed configuration for a water body.
//!
//! Every section has defaults, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! [surface]
//! mode = "heightmap"
//!
//! [surface.heightmap]
//! pixels_per_unit = 16.0
//! cadence = { kind = "per_second", rate = 30.0 }
//!
//! [buoyancy]
//! density = 1.2
//!
//! [obstruction]
//! mode = "static"
//! path = "assets/pool_mask.png"
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::buoyancy::BuoyancyParams;
use crate::clip::{ClipMethod, DEFAULT_CLIP_PRECISION};
use crate::geometry::shape::MIN_CURVE_SEGMENTS;
use crate::ripple::{HeightmapParams, ObstructionConfig};
use crate::surface::{SineWaves, SpringParams};

/// Which simulation shapes the water surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMode {
  /// Spring chain along the top edge; its heights are the waterline.
  #[default]
  Spring,
  /// Ripple heightmap over the water plane; its centre row is the
  /// waterline.
  Heightmap,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
  pub mode: SurfaceMode,
  pub spring: SpringParams,
  pub heightmap: HeightmapParams,
  pub waves: SineWaves,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClippingConfig {
  pub method: ClipMethod,
  /// Fixed-point scale for the band clip.
  pub precision: f64,
  /// Surface vertices skipped between waterline samples.
  pub waterline_stride: usize,
  /// Vertical motion that forces a waterline rebuild.
  pub waterline_epsilon: f32,
  /// Vertices used to approximate circles and capsule caps.
  pub curve_segments: usize,
}

impl Default for ClippingConfig {
  fn default() -> Self {
    Self {
      method: ClipMethod::Simple,
      precision: DEFAULT_CLIP_PRECISION,
      waterline_stride: 2,
      waterline_epsilon: 1e-3,
      curve_segments: 16,
    }
  }
}

/// How floating objects disturb the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
  /// Minimum vertical speed for a waterline crossing to disturb the surface.
  pub impact_velocity_threshold: f32,
  /// Object vertical velocity to surface velocity.
  pub impact_velocity_scale: f32,
  /// Cap on the surface velocity a single impact can set.
  pub max_impact_velocity: f32,
  /// Disturbance radius as a multiple of the object's half width.
  pub impact_radius_scale: f32,
  /// Heightmap stamp strength per unit of impact speed.
  pub ripple_strength_scale: f32,
  /// Minimum entry speed for a splash event.
  pub splash_velocity_threshold: f32,
  /// Lifetime of spawned splash effect entities, in seconds.
  pub splash_lifetime: f32,
  /// Height of the trigger volume above the resting waterline.
  pub trigger_margin: f32,
}

impl Default for InteractionConfig {
  fn default() -> Self {
    Self {
      impact_velocity_threshold: 0.5,
      impact_velocity_scale: 0.05,
      max_impact_velocity: 0.5,
      impact_radius_scale: 1.0,
      ripple_strength_scale: 0.05,
      splash_velocity_threshold: 2.0,
      splash_lifetime: 1.0,
      trigger_margin: 0.5,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
  pub enabled: bool,
  pub drops_per_second: f32,
  /// Surface velocity added by one drop (negative pushes down).
  pub drop_velocity: f32,
  /// Drop radius in world units.
  pub drop_radius: f32,
  /// Heightmap stamp strength of one drop.
  pub drop_strength: f32,
  /// Fixed seed for reproducible rain; random when absent.
  pub seed: Option<u64>,
}

impl Default for RainConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      drops_per_second: 8.0,
      drop_velocity: -0.05,
      drop_radius: 0.1,
      drop_strength: -0.1,
      seed: None,
    }
  }
}

/// Complete configuration of one water body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
  pub surface: SurfaceConfig,
  pub buoyancy: BuoyancyParams,
  pub clipping: ClippingConfig,
  pub interaction: InteractionConfig,
  pub rain: RainConfig,
  pub obstruction: ObstructionConfig,
}

#[derive(Debug)]
pub enum ConfigError {
  /// The file could not be read.
  Io { path: PathBuf, source: io::Error },
  /// The TOML is malformed or has wrongly typed values.
  Parse(toml::de::Error),
  /// A value is out of range.
  Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
      Self::Parse(e) => write!(f, "invalid water config: {e}"),
      Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse(e) => Some(e),
      Self::Invalid { .. } => None,
    }
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
  ConfigError::Invalid {
    field,
    reason: reason.into(),
  }
}

fn require(condition: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
  if condition {
    Ok(())
  } else {
    Err(invalid(field, reason))
  }
}

impl WaterConfig {
  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&source)
  }

  pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(self)
  }

  /// Checks value ranges that serde cannot express.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let spring = &self.surface.spring;
    require(
      spring.segments_per_unit.is_finite() && spring.segments_per_unit > 0.0,
      "surface.spring.segments_per_unit",
      "must be positive",
    )?;
    require(
      (0.0..=1.0).contains(&spring.damping),
      "surface.spring.damping",
      "must be within [0, 1]",
    )?;
    require(
      spring.spring_constant.is_finite() && spring.spring_constant >= 0.0,
      "surface.spring.spring_constant",
      "must be non-negative",
    )?;
    require(
      (0.0..=0.5).contains(&spring.spread),
      "surface.spring.spread",
      "must be within [0, 0.5]",
    )?;
    require(
      spring.wave_speed.is_finite(),
      "surface.spring.wave_speed",
      "must be finite",
    )?;

    let heightmap = &self.surface.heightmap;
    require(
      heightmap.pixels_per_unit.is_finite() && heightmap.pixels_per_unit > 0.0,
      "surface.heightmap.pixels_per_unit",
      "must be positive",
    )?;
    require(
      heightmap.surface_depth.is_finite() && heightmap.surface_depth > 0.0,
      "surface.heightmap.surface_depth",
      "must be positive",
    )?;
    require(
      (0.0..=1.0).contains(&heightmap.damping),
      "surface.heightmap.damping",
      "must be within [0, 1]",
    )?;
    require(
      (0.0..=1.0).contains(&heightmap.smoothing),
      "surface.heightmap.smoothing",
      "must be within [0, 1]",
    )?;
    require(
      heightmap.height_scale.is_finite(),
      "surface.heightmap.height_scale",
      "must be finite",
    )?;
    require(
      heightmap.max_catch_up_steps >= 1,
      "surface.heightmap.max_catch_up_steps",
      "must be at least 1",
    )?;

    let buoyancy = &self.buoyancy;
    require(
      buoyancy.gravity.iter().all(|g| g.is_finite()),
      "buoyancy.gravity",
      "must be finite",
    )?;
    require(
      buoyancy.density.is_finite() && buoyancy.density >= 0.0,
      "buoyancy.density",
      "must be non-negative",
    )?;
    require(
      buoyancy.linear.float_height > 0.0,
      "buoyancy.linear.float_height",
      "must be positive",
    )?;
    require(
      buoyancy.max_drag >= 0.0 && buoyancy.max_lift >= 0.0,
      "buoyancy.max_drag",
      "drag and lift caps must be non-negative",
    )?;

    let clipping = &self.clipping;
    require(
      clipping.precision.is_finite() && clipping.precision >= 1.0,
      "clipping.precision",
      "must be at least 1",
    )?;
    require(
      clipping.waterline_stride >= 1,
      "clipping.waterline_stride",
      "must be at least 1",
    )?;
    if clipping.curve_segments < MIN_CURVE_SEGMENTS {
      return Err(invalid(
        "clipping.curve_segments",
        format!("must be at least {MIN_CURVE_SEGMENTS}"),
      ));
    }

    let interaction = &self.interaction;
    require(
      interaction.max_impact_velocity.is_finite() && interaction.max_impact_velocity >= 0.0,
      "interaction.max_impact_velocity",
      "must be non-negative",
    )?;
    for (value, field) in [
      (
        interaction.impact_velocity_threshold,
        "interaction.impact_velocity_threshold",
      ),
      (
        interaction.impact_velocity_scale,
        "interaction.impact_velocity_scale",
      ),
      (
        interaction.impact_radius_scale,
        "interaction.impact_radius_scale",
      ),
      (
        interaction.ripple_strength_scale,
        "interaction.ripple_strength_scale",
      ),
      (
        interaction.splash_velocity_threshold,
        "interaction.splash_velocity_threshold",
      ),
      (interaction.trigger_margin, "interaction.trigger_margin"),
    ] {
      require(value.is_finite(), field, "must be finite")?;
    }
    require(
      interaction.splash_lifetime.is_finite() && interaction.splash_lifetime >= 0.0,
      "interaction.splash_lifetime",
      "must be non-negative",
    )?;

    require(
      self.rain.drops_per_second.is_finite() && self.rain.drops_per_second >= 0.0,
      "rain.drops_per_second",
      "must be non-negative",
    )?;
    Ok(())
  }
}
