//! Marionette Animation Core (engine-agnostic)
//!
//! Procedural 2D skeletal animation for a rigged character:
//! - `skeleton`: joints, bones, and the distance constraints derived from them
//! - `synth`: closed-form motion clips (walk, run, attack, idle, jump, death)
//! - `physics`: fixed-step integration, constraint relaxation, muscle/cloth forces
//! - `sampling`: keyframe bracketing and pose interpolation
//! - `filters` / `export` / `baking`: whole-clip post-processing and serialization
//! - `engine`: per-character session tying the above to an explicit `update(dt)` loop

pub mod baking;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod filters;
pub mod ids;
pub mod interp;
pub mod outputs;
pub mod physics;
pub mod sampling;
pub mod skeleton;
pub mod synth;

// Re-exports for hosts
pub use baking::{bake_clip, BakedClip, BakingConfig};
pub use config::{Config, LoopMode, PlaybackConfig};
pub use data::{parse_clip_json, Clip, JointPose, Keyframe, Vec2};
pub use engine::{Engine, PlaybackState};
pub use error::{AnimationError, Result};
pub use export::{export, ExportFormat};
pub use filters::{apply_gravity_bias, apply_muscle_tremor, smooth};
pub use ids::{BoneId, JointId};
pub use outputs::{Change, EngineEvent, Outputs};
pub use physics::{PhysicsProperties, PhysicsPropertiesUpdate, PhysicsState};
pub use sampling::{find_bracket, sample_frame, sample_pose, PoseSet};
pub use skeleton::{
    Bone, BoneDescriptor, Constraint, Joint, JointDescriptor, JointKind, Skeleton,
    SkeletonDescriptor,
};
pub use synth::{generate, synthesize, GenerationRequest, MotionType};
