use crate::data::{JointPose, Vec2};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(lerp_f32(a.x, b.x, t), lerp_f32(a.y, b.y, t))
}

/// Signed angular difference `b - a` wrapped into `[-180, 180)` degrees.
#[inline]
pub fn shortest_angle_delta(a: f32, b: f32) -> f32 {
    ((b - a) % 360.0 + 540.0) % 360.0 - 180.0
}

/// Interpolate degrees along the shorter arc; never travels more than 180°.
/// The result is not re-wrapped, so `t = 0` returns `a` exactly.
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + shortest_angle_delta(a, b) * t
}

/// Blend two joint poses: linear position/scale, shortest-arc rotation.
#[inline]
pub fn lerp_pose(a: &JointPose, b: &JointPose, t: f32) -> JointPose {
    JointPose {
        position: lerp_vec2(a.position, b.position, t),
        rotation: lerp_angle(a.rotation, b.rotation, t),
        scale: lerp_vec2(a.scale, b.scale, t),
    }
}
