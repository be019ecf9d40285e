//! Engine: one animated character's skeleton, live joint state, physics, and playback.
//!
//! The host drives it explicitly: `update(dt)` once per presented frame, `sample(time)`
//! for pure reads. Physics always advances in `Config::fixed_dt` ticks drawn from a time
//! accumulator, so the host refresh rate never changes simulation results. Engines share
//! nothing; animate several characters by creating several engines.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, LoopMode};
use crate::data::{Clip, JointPose, Vec2};
use crate::error::Result;
use crate::export::{export, ExportFormat};
use crate::ids::JointId;
use crate::outputs::{Change, EngineEvent, Outputs};
use crate::physics::{
    apply_cloth_forces, apply_muscle_tension, integrate, relax_constraints_iterated,
    PhysicsProperties, PhysicsPropertiesUpdate, PhysicsState,
};
use crate::sampling::{sample_pose, PoseSet};
use crate::skeleton::Skeleton;
use crate::synth::{generate, GenerationRequest};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug)]
struct Playback {
    state: PlaybackState,
    /// Seconds into the loaded clip.
    time: f32,
    speed: f32,
}

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    skeleton: Skeleton,

    // Live joint state, indexed by JointId.
    positions: Vec<Vec2>,
    rotations: Vec<f32>,
    scales: Vec<Vec2>,
    physics: PhysicsState,
    cloth_enabled: bool,

    clip: Option<Clip>,
    /// Skeleton joint driven by each `Clip::joints` entry; `None` for names the
    /// skeleton does not have.
    clip_targets: Vec<Option<JointId>>,
    playback: Playback,
    accumulator: f32,

    pending: Vec<EngineEvent>,
    outputs: Outputs,
}

impl Engine {
    /// Engine over the built-in biped.
    pub fn new(cfg: Config) -> Result<Self> {
        Self::with_skeleton(cfg, Skeleton::default_biped())
    }

    pub fn with_skeleton(cfg: Config, skeleton: Skeleton) -> Result<Self> {
        cfg.validate()?;
        let n = skeleton.joint_count();
        let rest = skeleton.rest_pose();
        Ok(Self {
            positions: rest.iter().map(|p| p.position).collect(),
            rotations: rest.iter().map(|p| p.rotation).collect(),
            scales: rest.iter().map(|p| p.scale).collect(),
            physics: PhysicsState::new(n),
            cloth_enabled: false,
            clip: None,
            clip_targets: Vec::new(),
            playback: Playback {
                state: PlaybackState::Stopped,
                time: 0.0,
                speed: 1.0,
            },
            accumulator: 0.0,
            pending: Vec::new(),
            outputs: Outputs::default(),
            skeleton,
            cfg,
        })
    }

    // ----- clips -----

    /// Run the generation pipeline against this engine's skeleton. The request's
    /// cloth flag becomes the engine's per-tick cloth toggle.
    pub fn generate_clip(&mut self, req: &GenerationRequest) -> Result<Clip> {
        let clip = generate(&self.skeleton, req)?;
        self.cloth_enabled = req.cloth_physics;
        Ok(clip)
    }

    /// Load a clip for playback. Playback stops at time 0 and physics state is cleared;
    /// joint positions keep their last computed values until the next update.
    ///
    /// Clip poses are matched to skeleton joints by name. Clip joints the skeleton
    /// lacks are ignored and skeleton joints the clip lacks hold their current pose.
    /// Clips breaking the keyframe invariants are rejected and the previous clip stays.
    pub fn load_clip(&mut self, clip: Clip) -> Result<()> {
        clip.validate()?;
        self.clip_targets = clip
            .joints
            .iter()
            .map(|name| {
                let id = self.skeleton.joint_id(name);
                if id.is_none() {
                    trace!("clip joint '{name}' not in skeleton; ignored");
                }
                id
            })
            .collect();
        debug!(
            "loading clip '{}' ({} keyframes @ {} fps)",
            clip.id,
            clip.keyframes.len(),
            clip.fps
        );
        self.clip = Some(clip);
        self.playback.state = PlaybackState::Stopped;
        self.playback.time = 0.0;
        self.accumulator = 0.0;
        self.physics.reset();
        Ok(())
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    /// Pure read of the loaded clip at `time` seconds.
    pub fn sample(&self, time: f32) -> Option<PoseSet> {
        self.clip.as_ref().map(|c| sample_pose(c, time))
    }

    /// Export the loaded clip. Without a clip the result is empty regardless of format.
    pub fn export(&self, format: &str) -> Result<String> {
        if self.clip.is_none() {
            return Ok(String::new());
        }
        let format: ExportFormat = format.parse()?;
        export(self.clip.as_ref(), format)
    }

    // ----- playback control -----

    pub fn play(&mut self) {
        let Some(clip) = self.clip.as_ref() else {
            debug!("play requested without a loaded clip");
            return;
        };
        match self.playback.state {
            PlaybackState::Playing => return,
            PlaybackState::Paused => self.pending.push(EngineEvent::PlaybackResumed),
            PlaybackState::Stopped => {
                // A clip that ran to its end starts over.
                if self.playback.time >= clip_period(clip) {
                    self.playback.time = 0.0;
                    self.accumulator = 0.0;
                }
                self.pending.push(EngineEvent::PlaybackStarted {
                    clip: clip.id.clone(),
                });
            }
        }
        debug!("playback -> playing at {:.3}s", self.playback.time);
        self.playback.state = PlaybackState::Playing;
    }

    /// Halt playback, keeping the cursor and joint state exactly as last computed.
    pub fn pause(&mut self) {
        if self.playback.state == PlaybackState::Playing {
            self.playback.state = PlaybackState::Paused;
            self.pending.push(EngineEvent::PlaybackPaused);
            debug!("playback -> paused at {:.3}s", self.playback.time);
        }
    }

    /// Halt playback and rewind the cursor. Joint state is not rolled back.
    pub fn stop(&mut self) {
        if self.playback.state != PlaybackState::Stopped {
            self.pending.push(EngineEvent::PlaybackStopped);
            debug!("playback -> stopped");
        }
        self.playback.state = PlaybackState::Stopped;
        self.playback.time = 0.0;
        self.accumulator = 0.0;
    }

    pub fn seek(&mut self, time: f32) {
        if !time.is_finite() {
            return;
        }
        let period = self.clip.as_ref().map(clip_period).unwrap_or(0.0);
        self.playback.time = time.clamp(0.0, period);
    }

    /// Set playback speed, clamped into the configured range.
    pub fn set_playback_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            debug!("ignoring non-finite playback speed");
            return;
        }
        let pb = &self.cfg.playback;
        self.playback.speed = speed.clamp(pb.min_speed, pb.max_speed);
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback.speed
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state
    }

    pub fn time(&self) -> f32 {
        self.playback.time
    }

    // ----- physics control -----

    pub fn enable_physics(&mut self, enabled: bool) {
        self.cfg.physics_enabled = enabled;
    }

    pub fn enable_cloth(&mut self, enabled: bool) {
        self.cloth_enabled = enabled;
    }

    pub fn set_wind(&mut self, wind: Vec2) {
        if wind.is_finite() {
            self.cfg.wind = wind;
        }
    }

    /// Reconfigure physics between ticks. Invalid updates leave the properties untouched.
    pub fn set_physics_properties(&mut self, update: PhysicsPropertiesUpdate) -> Result<()> {
        let next = self.cfg.physics.merged(&update)?;
        debug!("physics properties -> {next:?}");
        self.cfg.physics = next;
        Ok(())
    }

    pub fn physics_properties(&self) -> &PhysicsProperties {
        &self.cfg.physics
    }

    /// Pull the joints connected to `joint` toward it. Unknown joints are ignored.
    pub fn simulate_muscle_deformation(&mut self, joint: &str, tension: f32) {
        apply_muscle_tension(&self.skeleton, &self.positions, &mut self.physics, joint, tension);
    }

    /// Push cloth/fur joints with `wind` plus damped gravity, once.
    pub fn simulate_cloth_physics(&mut self, wind: Vec2) {
        apply_cloth_forces(&self.skeleton, &mut self.physics, &self.cfg.physics, wind);
    }

    /// One fixed physics tick on the current joint state. With physics disabled,
    /// pending forces are dropped instead of integrated.
    pub fn tick(&mut self) {
        if self.cloth_enabled {
            apply_cloth_forces(&self.skeleton, &mut self.physics, &self.cfg.physics, self.cfg.wind);
        }
        if self.cfg.physics_enabled {
            integrate(
                &mut self.positions,
                &mut self.physics,
                &self.cfg.physics,
                self.cfg.fixed_dt,
            );
        } else {
            self.physics.forces.fill(Vec2::ZERO);
        }
        relax_constraints_iterated(
            self.skeleton.constraints(),
            &mut self.positions,
            self.cfg.physics.stiffness,
            self.cfg.relaxation_iterations,
        );
    }

    // ----- stepping -----

    /// Advance playback by `dt` seconds of host time and run the fixed physics ticks
    /// that became due. Without a clip, or while not playing, joint state is left
    /// untouched and only pending control events are reported.
    pub fn update(&mut self, dt: f32) -> &Outputs {
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);

        if self.playback.state != PlaybackState::Playing || !dt.is_finite() || dt < 0.0 {
            return &self.outputs;
        }
        let Some(clip) = self.clip.as_ref() else {
            return &self.outputs;
        };

        // 1) Advance the cursor
        let period = clip_period(clip);
        self.playback.time += dt * self.playback.speed;
        if period <= 0.0 {
            self.playback.time = 0.0;
        } else if self.playback.time >= period {
            match self.cfg.playback.loop_mode {
                LoopMode::Loop => {
                    self.playback.time %= period;
                    self.outputs.push_event(EngineEvent::ClipLooped {
                        clip: clip.id.clone(),
                    });
                }
                LoopMode::Once => {
                    self.playback.time = period;
                    self.playback.state = PlaybackState::Stopped;
                    self.outputs.push_event(EngineEvent::PlaybackEnded { time: period });
                }
            }
        }

        // 2) Keyframe pose into live joint state
        let pose = sample_pose(clip, self.playback.time);
        for (p, target) in pose.poses.iter().zip(&self.clip_targets) {
            let Some(i) = target.map(JointId::index) else {
                continue;
            };
            if let (Some(pos), Some(rot), Some(scale)) = (
                self.positions.get_mut(i),
                self.rotations.get_mut(i),
                self.scales.get_mut(i),
            ) {
                *pos = p.position;
                *rot = p.rotation;
                *scale = p.scale;
            }
        }

        // 3) Fixed physics ticks
        self.accumulator += dt;
        let due = (self.accumulator / self.cfg.fixed_dt).floor() as u32;
        let steps = due.min(self.cfg.max_substeps);
        if due > steps {
            warn!("physics fell behind: {due} ticks due, running {steps}");
            self.outputs.push_event(EngineEvent::SubstepsClamped {
                requested: due,
                performed: steps,
            });
            self.accumulator = 0.0;
        } else {
            self.accumulator -= steps as f32 * self.cfg.fixed_dt;
        }
        for _ in 0..steps {
            self.tick();
        }

        // 4) Report
        for (i, joint) in self.skeleton.joints().iter().enumerate() {
            self.outputs.push_change(Change {
                joint: joint.name.clone(),
                pose: JointPose {
                    position: self.positions[i],
                    rotation: self.rotations[i],
                    scale: self.scales[i],
                },
            });
        }
        &self.outputs
    }

    // ----- accessors -----

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn rotations(&self) -> &[f32] {
        &self.rotations
    }

    pub fn joint_position(&self, name: &str) -> Option<Vec2> {
        let id = self.skeleton.joint_id(name)?;
        self.positions.get(id.index()).copied()
    }

    pub fn velocity(&self, name: &str) -> Option<Vec2> {
        let id = self.skeleton.joint_id(name)?;
        self.physics.velocities.get(id.index()).copied()
    }

    pub fn pending_force(&self, name: &str) -> Option<Vec2> {
        let id = self.skeleton.joint_id(name)?;
        self.physics.forces.get(id.index()).copied()
    }
}

/// Length of one playback cycle: the clip duration, or the last keyframe time if later.
fn clip_period(clip: &Clip) -> f32 {
    let duration = if clip.duration.is_finite() { clip.duration } else { 0.0 };
    duration.max(clip.end_time())
}
