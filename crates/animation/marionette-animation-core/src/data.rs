//! Canonical clip data model: poses, keyframes, clips.
//!
//! In memory a keyframe is a dense `Vec<JointPose>` in skeleton order. On the wire a
//! clip is `{id, name, type, keyframes: [{frame, joints: {name -> pose}}], duration, fps}`;
//! the conversion lives at the bottom of this file.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// 2D vector in the normalized 0..100 character space (y grows downward).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Local pose of one joint within a keyframe.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointPose {
    pub position: Vec2,
    /// Degrees.
    pub rotation: f32,
    pub scale: Vec2,
}

impl JointPose {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

/// Full-skeleton pose snapshot. `poses[i]` belongs to `JointId(i)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub poses: Vec<JointPose>,
}

/// An ordered, timed sequence of keyframes for one motion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "ClipWire", try_from = "ClipWire")]
pub struct Clip {
    pub id: String,
    pub name: String,
    /// Motion tag (`walk`, `run`, ... or whatever an importer supplied).
    pub motion_type: String,
    /// Joint names in the order every keyframe stores its poses.
    pub joints: Vec<String>,
    pub keyframes: Vec<Keyframe>,
    /// Seconds.
    pub duration: f32,
    pub fps: f32,
}

impl Clip {
    /// Check the clip invariants: positive fps, frame 0 present, non-decreasing frames,
    /// and every keyframe posing exactly the clip's joint set.
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(AnimationError::invalid("fps", format!("must be > 0, got {}", self.fps)));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AnimationError::invalid(
                "duration",
                format!("must be finite and >= 0, got {}", self.duration),
            ));
        }
        let Some(first) = self.keyframes.first() else {
            return Err(AnimationError::invalid("keyframes", "clip has no keyframes"));
        };
        if first.frame != 0 {
            return Err(AnimationError::invalid(
                "keyframes",
                format!("first keyframe must be frame 0, got {}", first.frame),
            ));
        }
        let mut last = 0;
        for kf in &self.keyframes {
            if kf.frame < last {
                return Err(AnimationError::invalid(
                    "keyframes",
                    format!("frame {} follows frame {last}", kf.frame),
                ));
            }
            last = kf.frame;
            if kf.poses.len() != self.joints.len() {
                return Err(AnimationError::invalid(
                    "keyframes",
                    format!(
                        "frame {} poses {} joints, clip has {}",
                        kf.frame,
                        kf.poses.len(),
                        self.joints.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.keyframes.len()
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j == name)
    }

    /// Pose of a named joint in keyframe `index`.
    pub fn pose(&self, index: usize, joint: &str) -> Option<&JointPose> {
        let j = self.joint_index(joint)?;
        self.keyframes.get(index)?.poses.get(j)
    }

    /// Seconds at which keyframe `index` sits.
    #[inline]
    pub fn keyframe_time(&self, index: usize) -> f32 {
        self.keyframes
            .get(index)
            .map(|kf| kf.frame as f32 / self.fps)
            .unwrap_or(0.0)
    }

    /// Time of the last keyframe (the sampling domain is `[0, end_time]`).
    #[inline]
    pub fn end_time(&self) -> f32 {
        self.keyframe_time(self.keyframes.len().saturating_sub(1))
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Serialize, Deserialize)]
struct ClipWire {
    id: String,
    name: String,
    #[serde(rename = "type")]
    motion_type: String,
    keyframes: Vec<KeyframeWire>,
    duration: f32,
    fps: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyframeWire {
    frame: u32,
    joints: IndexMap<String, JointPose>,
}

impl From<Clip> for ClipWire {
    fn from(clip: Clip) -> Self {
        let keyframes = clip
            .keyframes
            .into_iter()
            .map(|kf| KeyframeWire {
                frame: kf.frame,
                joints: clip.joints.iter().cloned().zip(kf.poses).collect(),
            })
            .collect();
        ClipWire {
            id: clip.id,
            name: clip.name,
            motion_type: clip.motion_type,
            keyframes,
            duration: clip.duration,
            fps: clip.fps,
        }
    }
}

impl TryFrom<ClipWire> for Clip {
    type Error = AnimationError;

    fn try_from(wire: ClipWire) -> Result<Self> {
        let joints: Vec<String> = wire
            .keyframes
            .first()
            .map(|kf| kf.joints.keys().cloned().collect())
            .unwrap_or_default();

        let mut keyframes = Vec::with_capacity(wire.keyframes.len());
        for kf in wire.keyframes {
            if kf.joints.len() != joints.len() {
                return Err(AnimationError::invalid(
                    "keyframes",
                    format!(
                        "frame {} poses {} joints, expected {}",
                        kf.frame,
                        kf.joints.len(),
                        joints.len()
                    ),
                ));
            }
            let mut poses = Vec::with_capacity(joints.len());
            for name in &joints {
                let pose = kf.joints.get(name).ok_or_else(|| {
                    AnimationError::invalid(
                        "keyframes",
                        format!("frame {} is missing joint '{name}'", kf.frame),
                    )
                })?;
                poses.push(*pose);
            }
            keyframes.push(Keyframe {
                frame: kf.frame,
                poses,
            });
        }

        let clip = Clip {
            id: wire.id,
            name: wire.name,
            motion_type: wire.motion_type,
            joints,
            keyframes,
            duration: wire.duration,
            fps: wire.fps,
        };
        clip.validate()?;
        Ok(clip)
    }
}

/// Parse a clip from its JSON export, enforcing the clip invariants.
pub fn parse_clip_json(s: &str) -> Result<Clip> {
    Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a - Vec2::new(1.0, 1.0), Vec2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(Vec2::ZERO.distance(a), 5.0);
    }

    #[test]
    fn wire_preserves_joint_order() {
        let clip = Clip {
            id: "c".into(),
            name: "C".into(),
            motion_type: "idle".into(),
            joints: vec!["b".into(), "a".into()],
            keyframes: vec![Keyframe {
                frame: 0,
                poses: vec![JointPose::at(Vec2::new(1.0, 2.0)), JointPose::at(Vec2::ZERO)],
            }],
            duration: 1.0,
            fps: 30.0,
        };
        let json = serde_json::to_string(&clip).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        let back = parse_clip_json(&json).unwrap();
        assert_eq!(back, clip);
    }
}
