//! Distance-constraint relaxation.
//!
//! A single pass is a Verlet-style projection, not a converged solve: under strong
//! forces bones may stay slightly off their rest length.

use crate::data::Vec2;
use crate::skeleton::Constraint;

/// One relaxation pass over `constraints`, in order.
///
/// For each pair the signed error `rest - distance` is split evenly between both
/// endpoints along the connecting axis and scaled by `stiffness`. Coincident joints
/// (distance 0) and out-of-range ids are skipped.
pub fn relax_constraints(constraints: &[Constraint], positions: &mut [Vec2], stiffness: f32) {
    let n = positions.len();
    for c in constraints {
        let (a, b) = (c.from.index(), c.to.index());
        if a >= n || b >= n || a == b {
            continue;
        }
        let delta = positions[b] - positions[a];
        let distance = delta.length();
        if distance <= 0.0 {
            continue;
        }
        let percent = (c.rest_length - distance) / distance / 2.0;
        let offset = delta * (percent * stiffness);
        positions[a] -= offset;
        positions[b] += offset;
    }
}

/// Run `iterations` relaxation passes (0 is a no-op).
pub fn relax_constraints_iterated(
    constraints: &[Constraint],
    positions: &mut [Vec2],
    stiffness: f32,
    iterations: u32,
) {
    for _ in 0..iterations {
        relax_constraints(constraints, positions, stiffness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::JointId;

    #[test]
    fn full_stiffness_restores_rest_length() {
        let c = [Constraint {
            from: JointId(0),
            to: JointId(1),
            rest_length: 10.0,
        }];
        let mut pos = vec![Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)];
        relax_constraints(&c, &mut pos, 1.0);
        assert_eq!(pos[0], Vec2::new(5.0, 0.0));
        assert_eq!(pos[1], Vec2::new(15.0, 0.0));
    }

    #[test]
    fn coincident_joints_are_left_alone() {
        let c = [Constraint {
            from: JointId(0),
            to: JointId(1),
            rest_length: 10.0,
        }];
        let mut pos = vec![Vec2::new(3.0, 3.0); 2];
        relax_constraints(&c, &mut pos, 1.0);
        assert_eq!(pos, vec![Vec2::new(3.0, 3.0); 2]);
    }
}
