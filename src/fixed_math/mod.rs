//! Deterministic fixed-point mathematics library.
//!
//! This module provides deterministic math types and operations using fixed-point
//! arithmetic to ensure identical behavior across different platforms and architectures.
//! This is critical for lockstep and rollback networking where all peers must simulate
//! identically.
//!
//! - [`FixedVec2`]: 2D vector
//! - [`Transform2D`]: affine transform (basis columns + origin)
//! - [`Aabb`]: axis-aligned bounding box with sweep and cast pre-tests
//! - [`RayCast`]: ray used by the query layer
//! - [`Matrix`]: general fixed-point matrix with checked algebra
//! - [`sin_cos`] / [`atan2`]: CORDIC trigonometry (integer shifts only)

use fixed::types::I48F16;

pub use aabb::Aabb;
pub use matrix::Matrix;
pub use ray::RayCast;
pub use transform::Transform2D;
pub use trig::{atan2, sin_cos};
pub use vec2::FixedVec2;

mod aabb;
mod matrix;
mod ray;
mod transform;
mod trig;
mod vec2;


/// Fixed-point number type used throughout the simulation.
///
/// Uses I48F16 format: 48 bits for the integer part, 16 bits for the fractional part.
/// This provides a range of approximately ±140 trillion with a precision of ~0.000015.
pub type FixedNum = I48F16;

/// π in I48F16.
pub const PI: FixedNum = FixedNum::from_bits(205_887);
/// π / 2 in I48F16.
pub const HALF_PI: FixedNum = FixedNum::from_bits(102_944);
/// 2π in I48F16.
pub const TAU: FixedNum = FixedNum::from_bits(2 * 205_887);
/// Tolerance used by geometric predicates (~0.00024).
pub const EPSILON: FixedNum = FixedNum::from_bits(16);

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: FixedNum) -> FixedNum {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let mut wrapped = (angle + PI) % TAU;
    if wrapped <= FixedNum::ZERO {
        wrapped += TAU;
    }
    wrapped - PI
}

/// Absolute difference check used by tests and geometric tolerances.
#[inline]
pub fn approx_eq(a: FixedNum, b: FixedNum, tolerance: FixedNum) -> bool {
    (a - b).abs() <= tolerance
}
