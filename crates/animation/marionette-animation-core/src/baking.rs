//! Baking API: resample a clip at a fixed rate through the pose sampler.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::data::{Clip, JointPose};
use crate::sampling::sample_pose;
use crate::synth::MAX_FRAMES;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakingConfig {
    /// Target frame rate (Hz) for baked samples.
    pub frame_rate: f32,
    /// Start time (seconds) in clip space.
    pub start_time: f32,
    /// End time (seconds) in clip space; if None, uses the clip duration.
    pub end_time: Option<f32>,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            start_time: 0.0,
            end_time: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedClip {
    pub clip_id: String,
    pub joints: Vec<String>,
    pub frame_rate: f32,
    pub start_time: f32,
    pub end_time: f32,
    /// `frames[f][j]` is joint `j` at `start_time + f / frame_rate`.
    pub frames: Vec<Vec<JointPose>>,
}

/// Bake `clip` over `[start, end]` inclusive of the end sample.
///
/// At most `MAX_FRAMES` samples are produced; a rate that would exceed it is lowered
/// so the samples still span the whole range.
pub fn bake_clip(clip: &Clip, cfg: &BakingConfig) -> BakedClip {
    let mut sr = if cfg.frame_rate.is_finite() && cfg.frame_rate > 0.0 {
        cfg.frame_rate
    } else {
        60.0
    };
    let duration = if clip.duration.is_finite() {
        clip.duration.max(0.0)
    } else {
        0.0
    };
    let start = cfg.start_time.clamp(0.0, duration);
    let mut end = cfg.end_time.unwrap_or(duration);
    if !end.is_finite() {
        end = duration;
    }
    let end = end.clamp(start, duration);
    let limit = (MAX_FRAMES - 1) as f32;
    let span = (end - start) * sr;
    let frame_count = if span <= limit {
        span.ceil() as usize + 1
    } else {
        let capped = limit / (end - start);
        warn!(
            "baking '{}' at {sr} Hz needs more than {MAX_FRAMES} frames; using {capped} Hz",
            clip.id
        );
        sr = capped;
        MAX_FRAMES as usize
    };

    let frames = (0..frame_count)
        .map(|f| {
            let t = if f + 1 == frame_count {
                end
            } else {
                (start + f as f32 / sr).min(end)
            };
            sample_pose(clip, t).poses
        })
        .collect();

    BakedClip {
        clip_id: clip.id.clone(),
        joints: clip.joints.clone(),
        frame_rate: sr,
        start_time: start,
        end_time: end,
        frames,
    }
}

/// Export baked data as serde_json::Value.
pub fn export_baked_json(baked: &BakedClip) -> serde_json::Value {
    serde_json::to_value(baked).unwrap_or(serde_json::Value::Null)
}
