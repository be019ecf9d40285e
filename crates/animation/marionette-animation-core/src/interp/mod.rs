//! Interpolation helpers.
//!
//! Positions and scales interpolate linearly; rotations (degrees) take the
//! shortest angular path.

pub mod functions;

pub use functions::{lerp_angle, lerp_f32, lerp_pose, lerp_vec2, shortest_angle_delta};
