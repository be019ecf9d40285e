//! Skeleton topology: joints, bones, and the distance constraints derived from bones.
//!
//! A `Skeleton` is immutable once built. Live joint state (positions, rotations,
//! velocities) is held elsewhere in arrays indexed by `JointId`.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::data::{JointPose, Vec2};
use crate::error::{AnimationError, Result};
use crate::ids::{BoneId, IdAllocator, JointId};

/// Expected rotational freedom of a joint. Descriptive only; the solver does not
/// enforce per-kind limits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    #[default]
    Ball,
    Hinge,
    Fixed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub name: String,
    /// Rest position in the normalized 0..100 space.
    pub position: Vec2,
    /// Rest rotation in degrees.
    pub rotation: f32,
    pub connections: Vec<JointId>,
    pub kind: JointKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    pub from: JointId,
    pub to: JointId,
    pub length: f32,
}

/// Enforced distance between two joints; one per bone, same order as `bones`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Constraint {
    pub from: JointId,
    pub to: JointId,
    pub rest_length: f32,
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Vec<Joint>,
    bones: Vec<Bone>,
    constraints: Vec<Constraint>,
    by_name: HashMap<String, JointId>,
}

impl Skeleton {
    /// Build a skeleton from the external descriptor, resolving every name once.
    pub fn from_descriptor(desc: &SkeletonDescriptor) -> Result<Self> {
        if desc.joints.is_empty() {
            return Err(AnimationError::invalid("joints", "skeleton has no joints"));
        }

        let mut ids = IdAllocator::new();
        let mut by_name = HashMap::with_capacity(desc.joints.len());
        for jd in &desc.joints {
            if !jd.position.is_finite() || !jd.rotation.is_finite() {
                return Err(AnimationError::invalid(
                    "joints",
                    format!("joint '{}' has a non-finite rest pose", jd.id),
                ));
            }
            let id = ids
                .alloc_joint()
                .ok_or_else(|| AnimationError::invalid("joints", "too many joints"))?;
            if by_name.insert(jd.id.clone(), id).is_some() {
                return Err(AnimationError::invalid(
                    "joints",
                    format!("duplicate joint id '{}'", jd.id),
                ));
            }
        }

        let resolve = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| AnimationError::missing_joint(name))
        };

        let mut joints = Vec::with_capacity(desc.joints.len());
        for (i, jd) in desc.joints.iter().enumerate() {
            let connections = jd
                .connections
                .iter()
                .map(|c| resolve(c.as_str()))
                .collect::<Result<Vec<_>>>()?;
            joints.push(Joint {
                id: JointId(i as u16),
                name: jd.id.clone(),
                position: jd.position,
                rotation: jd.rotation,
                connections,
                kind: jd.kind,
            });
        }

        let mut bones = Vec::with_capacity(desc.bones.len());
        let mut constraints = Vec::with_capacity(desc.bones.len());
        let mut bone_names = HashSet::with_capacity(desc.bones.len());
        for bd in &desc.bones {
            if !bd.length.is_finite() || bd.length <= 0.0 {
                return Err(AnimationError::invalid(
                    "bones",
                    format!("bone '{}' length must be > 0, got {}", bd.id, bd.length),
                ));
            }
            if !bone_names.insert(bd.id.as_str()) {
                return Err(AnimationError::invalid(
                    "bones",
                    format!("duplicate bone id '{}'", bd.id),
                ));
            }
            let from = resolve(bd.from.as_str())?;
            let to = resolve(bd.to.as_str())?;
            let id = ids
                .alloc_bone()
                .ok_or_else(|| AnimationError::invalid("bones", "too many bones"))?;
            bones.push(Bone {
                id,
                name: bd.id.clone(),
                from,
                to,
                length: bd.length,
            });
            constraints.push(Constraint {
                from,
                to,
                rest_length: bd.length,
            });
        }

        Ok(Self {
            joints,
            bones,
            constraints,
            by_name,
        })
    }

    /// The built-in 16-joint, 9-bone character rig.
    pub fn default_biped() -> Self {
        // The descriptor is a compile-time constant that resolves by construction.
        match Self::from_descriptor(&SkeletonDescriptor::default_biped()) {
            Ok(skeleton) => skeleton,
            Err(err) => unreachable!("built-in biped descriptor is invalid: {err}"),
        }
    }

    pub fn to_descriptor(&self) -> SkeletonDescriptor {
        SkeletonDescriptor {
            joints: self
                .joints
                .iter()
                .map(|j| JointDescriptor {
                    id: j.name.clone(),
                    position: j.position,
                    rotation: j.rotation,
                    connections: j
                        .connections
                        .iter()
                        .map(|c| self.joints[c.index()].name.clone())
                        .collect(),
                    kind: j.kind,
                })
                .collect(),
            bones: self
                .bones
                .iter()
                .map(|b| BoneDescriptor {
                    id: b.name.clone(),
                    from: self.joints[b.from.index()].name.clone(),
                    to: self.joints[b.to.index()].name.clone(),
                    length: b.length,
                })
                .collect(),
        }
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.index())
    }

    #[inline]
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    #[inline]
    pub fn joint_id(&self, name: &str) -> Option<JointId> {
        self.by_name.get(name).copied()
    }

    pub fn require_joint(&self, name: &str) -> Result<JointId> {
        self.joint_id(name)
            .ok_or_else(|| AnimationError::missing_joint(name))
    }

    pub fn connections(&self, id: JointId) -> &[JointId] {
        self.joint(id).map(|j| j.connections.as_slice()).unwrap_or(&[])
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }

    pub fn rest_positions(&self) -> Vec<Vec2> {
        self.joints.iter().map(|j| j.position).collect()
    }

    /// Rest pose of every joint (rotation from the rest rotation, unit scale).
    pub fn rest_pose(&self) -> Vec<JointPose> {
        self.joints
            .iter()
            .map(|j| JointPose {
                position: j.position,
                rotation: j.rotation,
                scale: Vec2::ONE,
            })
            .collect()
    }

    /// Current length of every bone given live joint positions (same order as `bones`).
    pub fn bone_lengths(&self, positions: &[Vec2]) -> Vec<f32> {
        self.bones
            .iter()
            .map(|b| match (positions.get(b.from.index()), positions.get(b.to.index())) {
                (Some(a), Some(c)) => a.distance(*c),
                _ => 0.0,
            })
            .collect()
    }

    /// Largest `|current - rest|` over all bones.
    pub fn max_stretch(&self, positions: &[Vec2]) -> f32 {
        self.bone_lengths(positions)
            .iter()
            .zip(&self.bones)
            .map(|(len, b)| (len - b.length).abs())
            .fold(0.0, f32::max)
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::default_biped()
    }
}

// ----- Descriptor schema (serde) -----

/// External skeleton description: `{joints: [...], bones: [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDescriptor {
    pub joints: Vec<JointDescriptor>,
    #[serde(default)]
    pub bones: Vec<BoneDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointDescriptor {
    pub id: String,
    pub position: Vec2,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default, alias = "type")]
    pub kind: JointKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneDescriptor {
    pub id: String,
    pub from: String,
    pub to: String,
    pub length: f32,
}

impl SkeletonDescriptor {
    pub fn default_biped() -> Self {
        use JointKind::{Ball, Fixed, Hinge};

        let joint = |id: &str, x: f32, y: f32, connections: &[&str], kind| JointDescriptor {
            id: id.to_string(),
            position: Vec2::new(x, y),
            rotation: 0.0,
            connections: connections.iter().map(|c| c.to_string()).collect(),
            kind,
        };
        let bone = |id: &str, from: &str, to: &str, length: f32| BoneDescriptor {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            length,
        };

        Self {
            joints: vec![
                joint("head", 48.0, 25.0, &["neck"], Ball),
                joint("neck", 48.0, 35.0, &["head", "torso"], Hinge),
                joint(
                    "torso",
                    48.0,
                    50.0,
                    &["neck", "right_shoulder", "left_shoulder", "pelvis"],
                    Fixed,
                ),
                joint("pelvis", 48.0, 65.0, &["torso", "right_hip", "left_hip"], Ball),
                joint("right_shoulder", 35.0, 40.0, &["torso", "right_elbow"], Ball),
                joint("right_elbow", 30.0, 50.0, &["right_shoulder", "right_hand"], Hinge),
                joint("right_hand", 25.0, 60.0, &["right_elbow"], Ball),
                joint("left_shoulder", 62.0, 40.0, &["torso", "left_elbow"], Ball),
                joint("left_elbow", 67.0, 50.0, &["left_shoulder", "left_hand"], Hinge),
                joint("left_hand", 72.0, 60.0, &["left_elbow"], Ball),
                joint("right_hip", 43.0, 65.0, &["pelvis", "right_knee"], Ball),
                joint("right_knee", 41.0, 80.0, &["right_hip", "right_foot"], Hinge),
                joint("right_foot", 39.0, 95.0, &["right_knee"], Ball),
                joint("left_hip", 53.0, 65.0, &["pelvis", "left_knee"], Ball),
                joint("left_knee", 55.0, 80.0, &["left_hip", "left_foot"], Hinge),
                joint("left_foot", 57.0, 95.0, &["left_knee"], Ball),
            ],
            bones: vec![
                bone("spine", "head", "pelvis", 40.0),
                bone("right_upper_arm", "right_shoulder", "right_elbow", 15.0),
                bone("right_forearm", "right_elbow", "right_hand", 12.0),
                bone("left_upper_arm", "left_shoulder", "left_elbow", 15.0),
                bone("left_forearm", "left_elbow", "left_hand", 12.0),
                bone("right_thigh", "right_hip", "right_knee", 18.0),
                bone("right_shin", "right_knee", "right_foot", 16.0),
                bone("left_thigh", "left_hip", "left_knee", 18.0),
                bone("left_shin", "left_knee", "left_foot", 16.0),
            ],
        }
    }
}
