//! Procedural clip synthesis.
//!
//! Each motion archetype is a closed-form pose function of `(joint name, t)` with
//! `t = frame / frame_count` in `[0, 1)`. Offsets are applied to the joint's rest pose;
//! joints an archetype does not drive hold their rest pose. No randomness: identical
//! inputs produce identical keyframes (clip ids aside).

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::{Clip, JointPose, Keyframe, Vec2};
use crate::error::{AnimationError, Result};
use crate::filters::{apply_gravity_bias, apply_muscle_tremor, smooth};
use crate::skeleton::Skeleton;

/// Upper bound on synthesized keyframes per clip.
pub const MAX_FRAMES: u32 = 100_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionType {
    Walk,
    Run,
    Attack,
    Idle,
    Jump,
    Death,
}

impl MotionType {
    pub const ALL: [MotionType; 6] = [
        MotionType::Walk,
        MotionType::Run,
        MotionType::Attack,
        MotionType::Idle,
        MotionType::Jump,
        MotionType::Death,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotionType::Walk => "walk",
            MotionType::Run => "run",
            MotionType::Attack => "attack",
            MotionType::Idle => "idle",
            MotionType::Jump => "jump",
            MotionType::Death => "death",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MotionType::Walk => "Walk Cycle",
            MotionType::Run => "Run Cycle",
            MotionType::Attack => "Attack",
            MotionType::Idle => "Idle",
            MotionType::Jump => "Jump",
            MotionType::Death => "Death",
        }
    }

    /// Clip length in seconds at speed 1.
    pub fn base_duration(self) -> f32 {
        match self {
            MotionType::Walk => 2.0,
            MotionType::Run => 1.5,
            MotionType::Attack => 1.0,
            MotionType::Idle => 3.0,
            MotionType::Jump => 1.2,
            MotionType::Death => 2.5,
        }
    }

    /// Pose of `joint` at normalized time `t`, relative to its rest pose.
    pub fn pose(self, joint: &str, rest: &JointPose, t: f32) -> JointPose {
        match self {
            MotionType::Walk => walk(joint, rest, t),
            MotionType::Run => run(joint, rest, t),
            MotionType::Attack => attack(joint, rest, t),
            MotionType::Idle => idle(joint, rest, t),
            MotionType::Jump => jump(joint, rest, t),
            MotionType::Death => death(joint, rest, t),
        }
    }
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotionType {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        MotionType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AnimationError::UnsupportedMotionType { name: s.to_string() })
    }
}

#[inline]
fn offset(rest: &JointPose, dy: f32, rotation: f32) -> JointPose {
    JointPose {
        position: Vec2::new(rest.position.x, rest.position.y + dy),
        rotation: rest.rotation + rotation,
        scale: rest.scale,
    }
}

fn walk(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let swing = (t * PI * 4.0).sin() * 0.5;
    let leg = (t * PI * 4.0).sin();
    let bob = (t * PI * 8.0).sin();
    match joint {
        "torso" => offset(rest, bob * 2.0, (t * PI * 4.0).sin() * 5.0),
        "right_shoulder" => offset(rest, 0.0, swing * 30.0),
        "left_shoulder" => offset(rest, 0.0, -swing * 30.0),
        "right_hip" => offset(rest, 0.0, leg * 25.0),
        "left_hip" => offset(rest, 0.0, -leg * 25.0),
        "head" => offset(rest, bob, (t * PI * 4.0).sin() * 3.0),
        _ => *rest,
    }
}

fn run(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let swing = (t * PI * 6.0).sin() * 0.7;
    let leg = (t * PI * 6.0).sin();
    match joint {
        "torso" => offset(rest, (t * PI * 12.0).sin() * 3.0, (t * PI * 6.0).sin() * 8.0),
        "right_shoulder" => offset(rest, 0.0, swing * 50.0),
        "left_shoulder" => offset(rest, 0.0, -swing * 50.0),
        "right_hip" => offset(rest, 0.0, leg * 40.0),
        "left_hip" => offset(rest, 0.0, -leg * 40.0),
        _ => *rest,
    }
}

/// Arm angle for the three attack phases: windup, strike, recovery.
fn attack_arm(t: f32) -> f32 {
    if t < 0.3 {
        -45.0 * (t / 0.3)
    } else if t < 0.7 {
        -45.0 + 90.0 * ((t - 0.3) / 0.4)
    } else {
        45.0 - 45.0 * ((t - 0.7) / 0.3)
    }
}

fn attack(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let arm = attack_arm(t);
    match joint {
        "right_shoulder" => offset(rest, 0.0, arm),
        "torso" => offset(rest, 0.0, arm * 0.3),
        _ => *rest,
    }
}

fn idle(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let breath = (t * PI * 4.0).sin() * 0.5;
    match joint {
        "torso" => {
            let pulse = 1.0 + breath * 0.02;
            JointPose {
                scale: Vec2::new(rest.scale.x * pulse, rest.scale.y * pulse),
                ..offset(rest, breath, breath * 2.0)
            }
        }
        "head" => offset(rest, breath * 0.5, (t * PI * 2.0).sin() * 3.0),
        _ => *rest,
    }
}

fn jump(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let height = (t * PI).sin() * 30.0;
    let tuck = (t * PI).sin() * 20.0;
    match joint {
        "torso" => offset(rest, -height, 0.0),
        "right_shoulder" | "left_shoulder" => offset(rest, -height, -30.0),
        "right_hip" | "left_hip" => offset(rest, -height, tuck),
        _ => *rest,
    }
}

fn death(joint: &str, rest: &JointPose, t: f32) -> JointPose {
    let collapse = (t * 1.5).min(1.0);
    match joint {
        "torso" => JointPose {
            scale: Vec2::new(rest.scale.x, rest.scale.y * (1.0 - collapse * 0.2)),
            ..offset(rest, collapse * 30.0, collapse * 90.0)
        },
        "head" => offset(rest, collapse * 50.0, collapse * 45.0),
        "right_shoulder" => offset(rest, collapse * 20.0, collapse * 60.0),
        "left_shoulder" => offset(rest, collapse * 20.0, -collapse * 60.0),
        _ => *rest,
    }
}

/// Frame count for a motion at `fps` and `speed`: `floor(fps × base / speed)`.
pub fn frame_count(motion: MotionType, fps: f32, speed: f32) -> Result<u32> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(AnimationError::invalid("fps", format!("must be > 0, got {fps}")));
    }
    if !speed.is_finite() || speed <= 0.0 {
        return Err(AnimationError::invalid("speed", format!("must be > 0, got {speed}")));
    }
    let frames = (fps * motion.base_duration() / speed).floor();
    if frames < 1.0 {
        return Err(AnimationError::invalid(
            "fps",
            format!("{motion} at fps {fps} and speed {speed} yields no frames"),
        ));
    }
    if frames > MAX_FRAMES as f32 {
        return Err(AnimationError::invalid(
            "fps",
            format!("{motion} at fps {fps} and speed {speed} exceeds {MAX_FRAMES} frames"),
        ));
    }
    Ok(frames as u32)
}

/// Generate the raw keyframes of `motion` for every joint of `skeleton`.
pub fn synthesize(skeleton: &Skeleton, motion: MotionType, fps: f32, speed: f32) -> Result<Clip> {
    let frames = frame_count(motion, fps, speed)?;
    let duration = motion.base_duration() / speed;
    let rest = skeleton.rest_pose();

    let keyframes: Vec<Keyframe> = (0..frames)
        .map(|frame| {
            let t = frame as f32 / frames as f32;
            let poses = skeleton
                .joints()
                .iter()
                .zip(&rest)
                .map(|(joint, rest)| motion.pose(&joint.name, rest, t))
                .collect();
            Keyframe { frame, poses }
        })
        .collect();

    debug!("synthesized {motion}: {frames} keyframes, {duration:.3}s at {fps} fps");

    Ok(Clip {
        id: format!("{}_{}", motion.as_str(), Uuid::new_v4().simple()),
        name: motion.display_name().to_string(),
        motion_type: motion.as_str().to_string(),
        joints: skeleton.joint_names(),
        keyframes,
        duration,
        fps,
    })
}

/// Clip generation request as received from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub motion_type: String,
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub physics_enabled: bool,
    #[serde(default)]
    pub muscle_simulation: bool,
    #[serde(default)]
    pub cloth_physics: bool,
    #[serde(default = "default_smoothness")]
    pub smoothness: f32,
}

fn default_fps() -> f32 {
    30.0
}

fn default_speed() -> f32 {
    1.0
}

fn default_smoothness() -> f32 {
    0.8
}

impl GenerationRequest {
    /// Request with default fps/speed/smoothness and all optional passes off.
    pub fn new(motion: MotionType) -> Self {
        Self {
            motion_type: motion.as_str().to_string(),
            fps: default_fps(),
            speed: default_speed(),
            physics_enabled: false,
            muscle_simulation: false,
            cloth_physics: false,
            smoothness: default_smoothness(),
        }
    }
}

/// Full generation pipeline: synthesize, then the optional gravity bias, muscle
/// tremor, and smoothing passes, in that order.
pub fn generate(skeleton: &Skeleton, req: &GenerationRequest) -> Result<Clip> {
    let motion: MotionType = req.motion_type.parse()?;
    if !(0.0..=1.0).contains(&req.smoothness) {
        return Err(AnimationError::invalid(
            "smoothness",
            format!("must be within [0, 1], got {}", req.smoothness),
        ));
    }

    let mut clip = synthesize(skeleton, motion, req.fps, req.speed)?;
    if req.physics_enabled {
        clip.keyframes = apply_gravity_bias(&clip.keyframes);
    }
    if req.muscle_simulation {
        clip.keyframes = apply_muscle_tremor(&clip.keyframes);
    }
    if req.smoothness > 0.0 {
        clip.keyframes = smooth(&clip.keyframes, req.smoothness);
    }
    Ok(clip)
}
