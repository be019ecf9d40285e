//! External force injection. Forces land in `PhysicsState::forces` and are consumed by
//! the next `integrate`. Unknown targets are silent no-ops.

use log::trace;

use crate::data::Vec2;
use crate::physics::{PhysicsProperties, PhysicsState};
use crate::skeleton::Skeleton;

/// Fraction of gravity added to cloth joints on top of the wind.
const CLOTH_GRAVITY_SCALE: f32 = 0.1;

/// Cloth/fur naming convention.
#[inline]
pub fn is_cloth_joint(name: &str) -> bool {
    name.contains("cloth") || name.contains("fur")
}

/// Pull every joint connected to `joint` toward it with magnitude `tension`
/// (`direction · tension`, i.e. the offset vector scaled by `tension / distance`).
pub fn apply_muscle_tension(
    skeleton: &Skeleton,
    positions: &[Vec2],
    state: &mut PhysicsState,
    joint: &str,
    tension: f32,
) {
    let Some(id) = skeleton.joint_id(joint) else {
        trace!("muscle tension target '{joint}' not in skeleton; ignored");
        return;
    };
    let Some(&center) = positions.get(id.index()) else {
        return;
    };
    for other in skeleton.connections(id) {
        let Some(&p) = positions.get(other.index()) else {
            continue;
        };
        let offset = center - p;
        let distance = offset.length();
        if distance > 0.0 {
            state.add_force(other.index(), offset * (tension / distance));
        }
    }
}

/// Add `wind` plus a damped gravity term to every cloth/fur joint.
pub fn apply_cloth_forces(
    skeleton: &Skeleton,
    state: &mut PhysicsState,
    props: &PhysicsProperties,
    wind: Vec2,
) {
    let force = wind + Vec2::new(0.0, props.gravity * CLOTH_GRAVITY_SCALE);
    for joint in skeleton.joints() {
        if is_cloth_joint(&joint.name) {
            state.add_force(joint.id.index(), force);
        }
    }
}
