//! Core configuration for marionette-animation-core.

use serde::{Deserialize, Serialize};

use crate::data::Vec2;
use crate::error::{AnimationError, Result};
use crate::physics::{PhysicsProperties, FIXED_DT};

/// Per-engine configuration. Everything here can be deserialized from JSON; missing
/// fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Physics tick length in seconds, independent of clip fps and host refresh rate.
    pub fixed_dt: f32,
    /// Maximum fixed ticks per `Engine::update`; surplus accumulated time is dropped.
    pub max_substeps: u32,
    /// Constraint relaxation passes per tick.
    pub relaxation_iterations: u32,
    pub physics: PhysicsProperties,
    pub physics_enabled: bool,
    /// Wind fed to cloth joints each tick while cloth simulation is on.
    pub wind: Vec2,
    pub playback: PlaybackConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub min_speed: f32,
    pub max_speed: f32,
    pub loop_mode: LoopMode,
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            max_substeps: 8,
            relaxation_iterations: 1,
            physics: PhysicsProperties::default(),
            physics_enabled: true,
            wind: Vec2::ZERO,
            playback: PlaybackConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_speed: 0.1,
            max_speed: 3.0,
            loop_mode: LoopMode::Loop,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(AnimationError::invalid(
                "fixed_dt",
                format!("must be > 0, got {}", self.fixed_dt),
            ));
        }
        if self.max_substeps == 0 {
            return Err(AnimationError::invalid("max_substeps", "must be >= 1"));
        }
        if self.relaxation_iterations == 0 {
            return Err(AnimationError::invalid("relaxation_iterations", "must be >= 1"));
        }
        if !self.wind.is_finite() {
            return Err(AnimationError::invalid("wind", "must be finite"));
        }
        let pb = &self.playback;
        if !(pb.min_speed > 0.0) || !(pb.max_speed >= pb.min_speed) || !pb.max_speed.is_finite() {
            return Err(AnimationError::invalid(
                "playback",
                format!("speed range [{}, {}] is invalid", pb.min_speed, pb.max_speed),
            ));
        }
        self.physics.validate()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
