//! Joint physics: explicit integration, distance-constraint relaxation, and force
//! injection (muscle tension, cloth wind).
//!
//! All per-joint arrays are indexed by `JointId`. Forces accumulate between ticks and
//! are consumed (then zeroed) by `integrate`.

pub mod constraints;
pub mod forces;

use serde::{Deserialize, Serialize};

use crate::data::Vec2;
use crate::error::{AnimationError, Result};

pub use constraints::{relax_constraints, relax_constraints_iterated};
pub use forces::{apply_cloth_forces, apply_muscle_tension, is_cloth_joint};

/// Default fixed simulation step (seconds).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Shared, read-only-during-a-tick physics configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsProperties {
    pub gravity: f32,
    /// Velocity multiplier applied once per tick.
    pub damping: f32,
    /// Fraction of the constraint error corrected per relaxation pass.
    pub stiffness: f32,
    /// Per-joint mass.
    pub mass: f32,
}

impl Default for PhysicsProperties {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            damping: 0.95,
            stiffness: 0.8,
            mass: 1.0,
        }
    }
}

impl PhysicsProperties {
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(AnimationError::invalid("gravity", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(AnimationError::invalid(
                "damping",
                format!("must be within [0, 1], got {}", self.damping),
            ));
        }
        if !(0.0..=1.0).contains(&self.stiffness) {
            return Err(AnimationError::invalid(
                "stiffness",
                format!("must be within [0, 1], got {}", self.stiffness),
            ));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(AnimationError::invalid(
                "mass",
                format!("must be > 0, got {}", self.mass),
            ));
        }
        Ok(())
    }

    /// Apply a partial update, returning the merged properties if they validate.
    pub fn merged(&self, update: &PhysicsPropertiesUpdate) -> Result<Self> {
        let next = Self {
            gravity: update.gravity.unwrap_or(self.gravity),
            damping: update.damping.unwrap_or(self.damping),
            stiffness: update.stiffness.unwrap_or(self.stiffness),
            mass: update.mass.unwrap_or(self.mass),
        };
        next.validate()?;
        Ok(next)
    }
}

/// Partial reconfiguration applied between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsPropertiesUpdate {
    #[serde(default)]
    pub gravity: Option<f32>,
    #[serde(default)]
    pub damping: Option<f32>,
    #[serde(default)]
    pub stiffness: Option<f32>,
    #[serde(default)]
    pub mass: Option<f32>,
}

/// Ephemeral per-joint velocity and accumulated force.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsState {
    pub velocities: Vec<Vec2>,
    pub forces: Vec<Vec2>,
}

impl PhysicsState {
    pub fn new(joint_count: usize) -> Self {
        Self {
            velocities: vec![Vec2::ZERO; joint_count],
            forces: vec![Vec2::ZERO; joint_count],
        }
    }

    pub fn reset(&mut self) {
        self.velocities.fill(Vec2::ZERO);
        self.forces.fill(Vec2::ZERO);
    }

    #[inline]
    pub fn add_force(&mut self, index: usize, force: Vec2) {
        if let Some(f) = self.forces.get_mut(index) {
            *f += force;
        }
    }
}

/// One explicit Euler step for every joint:
/// `f.y += g·m; v += f·dt/m; v *= damping; p += v·dt; f = 0`.
pub fn integrate(positions: &mut [Vec2], state: &mut PhysicsState, props: &PhysicsProperties, dt: f32) {
    let mass = props.mass;
    for ((p, v), f) in positions
        .iter_mut()
        .zip(state.velocities.iter_mut())
        .zip(state.forces.iter_mut())
    {
        f.y += props.gravity * mass;
        *v += *f * (dt / mass);
        *v = *v * props.damping;
        *p += *v * dt;
        *f = Vec2::ZERO;
    }
}
