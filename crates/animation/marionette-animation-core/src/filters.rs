//! Whole-clip post-processing passes. Every pass returns a new keyframe sequence.

use crate::data::Keyframe;
use crate::interp::lerp_f32;

/// Weight applied to `smoothness` when pulling a pose toward its neighbours' mean.
const SMOOTHING_GAIN: f32 = 0.3;
/// Vertical midline of the normalized space; joints below it get the gravity bias.
const MIDLINE_Y: f32 = 50.0;
const GRAVITY_BIAS: f32 = 0.5;
const TREMOR_FREQUENCY: f32 = 0.5;
const TREMOR_AMPLITUDE: f32 = 0.2;

/// 3-point temporal smoothing of positions and rotations.
///
/// Interior keyframes move toward the mean of their neighbours by
/// `smoothness × 0.3`. Keyframes are visited in order, so each one reads its
/// already-smoothed predecessor and its unsmoothed successor. The first and last
/// keyframes are copied unchanged, and inputs shorter than three keyframes are
/// returned as-is.
pub fn smooth(keyframes: &[Keyframe], smoothness: f32) -> Vec<Keyframe> {
    let mut out = keyframes.to_vec();
    if keyframes.len() < 3 {
        return out;
    }
    let w = smoothness.clamp(0.0, 1.0) * SMOOTHING_GAIN;
    if w == 0.0 {
        return out;
    }

    for i in 1..keyframes.len() - 1 {
        let (done, rest) = out.split_at_mut(i);
        let prev = &done[i - 1];
        let next = &keyframes[i + 1];
        for (j, pose) in rest[0].poses.iter_mut().enumerate() {
            let (Some(p), Some(n)) = (prev.poses.get(j), next.poses.get(j)) else {
                continue;
            };
            pose.position.x = lerp_f32(pose.position.x, (p.position.x + n.position.x) / 2.0, w);
            pose.position.y = lerp_f32(pose.position.y, (p.position.y + n.position.y) / 2.0, w);
            pose.rotation = lerp_f32(pose.rotation, (p.rotation + n.rotation) / 2.0, w);
        }
    }
    out
}

/// One-shot gravity bias: joints below the midline (`y > 50`) sink by a constant
/// offset in every keyframe. Not a dynamic simulation.
pub fn apply_gravity_bias(keyframes: &[Keyframe]) -> Vec<Keyframe> {
    let mut out = keyframes.to_vec();
    for pose in out.iter_mut().flat_map(|kf| kf.poses.iter_mut()) {
        if pose.position.y > MIDLINE_Y {
            pose.position.y += GRAVITY_BIAS;
        }
    }
    out
}

/// Muscle tremor: every joint's rotation in keyframe `i` is offset by
/// `sin(i × 0.5) × 0.2` degrees.
pub fn apply_muscle_tremor(keyframes: &[Keyframe]) -> Vec<Keyframe> {
    let mut out = keyframes.to_vec();
    for (i, kf) in out.iter_mut().enumerate() {
        let tremor = (i as f32 * TREMOR_FREQUENCY).sin() * TREMOR_AMPLITUDE;
        for pose in &mut kf.poses {
            pose.rotation += tremor;
        }
    }
    out
}
