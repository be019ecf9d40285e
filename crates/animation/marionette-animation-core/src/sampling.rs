//! Pose sampling over a clip's keyframes.
//!
//! Model:
//! - Keyframe `i` sits at `frame_i / fps` seconds.
//! - Sampling time `s` picks the bracket `[i, i+1]` with `time_i <= s < time_(i+1)`.
//! - Before the first or at/after the last keyframe the boundary pose is returned as-is
//!   (no extrapolation).
//! - Inside a bracket: linear position/scale, shortest-arc rotation.

use crate::data::{Clip, JointPose, Keyframe};
use crate::ids::JointId;
use crate::interp::lerp_pose;
use crate::skeleton::Skeleton;

/// A sampled full-skeleton pose, indexed by `JointId`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseSet {
    pub poses: Vec<JointPose>,
}

impl PoseSet {
    #[inline]
    pub fn get(&self, id: JointId) -> Option<&JointPose> {
        self.poses.get(id.index())
    }

    /// Look up by name through the skeleton the clip was built for.
    pub fn by_name(&self, skeleton: &Skeleton, name: &str) -> Option<&JointPose> {
        self.get(skeleton.joint_id(name)?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

/// Find the keyframe pair bracketing `time` (seconds) and the blend factor between them.
///
/// Returns `(prev, next, t)` with `t` in `[0, 1)`. Boundary and degenerate cases return
/// `prev == next` with `t = 0`. A zero-length bracket (repeated frame index) also yields
/// `t = 0`.
pub fn find_bracket(keyframes: &[Keyframe], fps: f32, time: f32) -> (usize, usize, f32) {
    let n = keyframes.len();
    if n <= 1 || !(fps > 0.0) {
        return (0, 0, 0.0);
    }
    let time_of = |i: usize| keyframes[i].frame as f32 / fps;

    if !(time > time_of(0)) {
        return (0, 0, 0.0);
    }
    if time >= time_of(n - 1) {
        return (n - 1, n - 1, 0.0);
    }

    // Last keyframe whose time is <= `time`; the guards above make 1 <= idx <= n-1.
    let idx = keyframes.partition_point(|kf| kf.frame as f32 / fps <= time);
    let prev = idx - 1;
    let next = idx.min(n - 1);
    let t0 = time_of(prev);
    let t1 = time_of(next);
    if t1 == t0 {
        return (prev, next, 0.0);
    }
    let t = ((time - t0) / (t1 - t0)).clamp(0.0, 1.0);
    (prev, next, t)
}

/// Sample the clip at `time` seconds.
pub fn sample_pose(clip: &Clip, time: f32) -> PoseSet {
    if clip.keyframes.is_empty() {
        return PoseSet::default();
    }
    let (i0, i1, t) = find_bracket(&clip.keyframes, clip.fps, time);
    let prev = &clip.keyframes[i0];
    if i0 == i1 || t == 0.0 {
        return PoseSet {
            poses: prev.poses.clone(),
        };
    }
    let next = &clip.keyframes[i1];
    let poses = prev
        .poses
        .iter()
        .zip(&next.poses)
        .map(|(a, b)| lerp_pose(a, b, t))
        .collect();
    PoseSet { poses }
}

/// Sample at a (fractional) frame index.
#[inline]
pub fn sample_frame(clip: &Clip, frame: f32) -> PoseSet {
    let time = if clip.fps > 0.0 { frame / clip.fps } else { 0.0 };
    sample_pose(clip, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Vec2;

    fn kf(frame: u32, x: f32) -> Keyframe {
        Keyframe {
            frame,
            poses: vec![JointPose::at(Vec2::new(x, 0.0))],
        }
    }

    #[test]
    fn bracket_edges() {
        let kfs = vec![kf(0, 0.0), kf(10, 1.0), kf(20, 2.0)];
        assert_eq!(find_bracket(&kfs, 10.0, -1.0), (0, 0, 0.0));
        assert_eq!(find_bracket(&kfs, 10.0, 0.0), (0, 0, 0.0));
        assert_eq!(find_bracket(&kfs, 10.0, 1.0), (1, 2, 0.0));
        assert_eq!(find_bracket(&kfs, 10.0, 0.5), (0, 1, 0.5));
        assert_eq!(find_bracket(&kfs, 10.0, 2.0), (2, 2, 0.0));
        assert_eq!(find_bracket(&kfs, 10.0, 9.0), (2, 2, 0.0));
    }

    #[test]
    fn repeated_frames_do_not_divide_by_zero() {
        let kfs = vec![kf(0, 0.0), kf(5, 1.0), kf(5, 3.0), kf(10, 4.0)];
        let (i0, i1, t) = find_bracket(&kfs, 10.0, 0.5);
        assert_eq!((i0, i1), (2, 3));
        assert_eq!(t, 0.0);
    }
}
