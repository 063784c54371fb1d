use super::{FixedNum, FixedVec2};
use crate::error::{PhysicsError, PhysicsResult};

/// A finite ray: `origin + direction * t` for `t` in `[0, distance]`.
///
/// `direction` is always unit length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayCast {
    pub origin: FixedVec2,
    pub direction: FixedVec2,
    pub distance: FixedNum,
}

impl RayCast {
    /// Ray from `origin` to `destination`.
    pub fn between(origin: FixedVec2, destination: FixedVec2) -> PhysicsResult<Self> {
        let delta = destination - origin;
        let distance = delta.length();
        if distance == FixedNum::ZERO {
            return Err(PhysicsError::ZeroLengthVector("ray origin equals destination"));
        }
        Ok(Self {
            origin,
            direction: delta.normalize(),
            distance,
        })
    }

    /// Ray along `direction` (normalized here) for `distance` units.
    pub fn along(origin: FixedVec2, direction: FixedVec2, distance: FixedNum) -> PhysicsResult<Self> {
        let direction = direction.normalize();
        if direction.is_zero() {
            return Err(PhysicsError::ZeroLengthVector("ray direction"));
        }
        Ok(Self { origin, direction, distance })
    }

    pub fn point_at(&self, t: FixedNum) -> FixedVec2 {
        self.origin + self.direction * t
    }

    pub fn end(&self) -> FixedVec2 {
        self.point_at(self.distance)
    }
}
