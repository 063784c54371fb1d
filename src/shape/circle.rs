use serde::{Deserialize, Serialize};

use super::ShapeHit;
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast, Transform2D};

/// Circle geometry in body space plus its cached world-space origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub body_origin: FixedVec2,
    pub radius: FixedNum,
    pub world_origin: FixedVec2,
}

impl Circle {
    pub fn new(body_origin: FixedVec2, radius: FixedNum) -> Self {
        Self {
            body_origin,
            radius,
            world_origin: body_origin,
        }
    }

    pub fn area(&self) -> FixedNum {
        crate::fixed_math::PI * self.radius * self.radius
    }

    /// Moment of inertia about the body origin for the given mass
    /// (disc term plus parallel axis offset).
    pub fn inertia(&self, mass: FixedNum) -> FixedNum {
        let half = FixedNum::from_num(0.5);
        mass * (self.radius * self.radius * half + self.body_origin.length_squared())
    }

    pub fn body_aabb(&self) -> Aabb {
        Aabb::from_circle(self.body_origin, self.radius)
    }

    pub fn world_aabb(&self) -> Aabb {
        Aabb::from_circle(self.world_origin, self.radius)
    }

    pub fn apply_body_position(&mut self, pose: &Transform2D) {
        self.world_origin = pose.xform(self.body_origin);
    }

    pub fn contains_point(&self, point: FixedVec2) -> bool {
        point.distance_squared(self.body_origin) <= self.radius * self.radius
    }

    pub fn overlaps_circle(&self, center: FixedVec2, radius: FixedNum) -> bool {
        let reach = self.radius + radius;
        center.distance_squared(self.body_origin) <= reach * reach
    }

    pub fn ray_cast(&self, ray: &RayCast) -> Option<ShapeHit> {
        cast_against_circle(ray, self.body_origin, self.radius)
    }

    /// A swept circle against a circle is a ray against the summed radius.
    pub fn circle_cast(&self, ray: &RayCast, radius: FixedNum) -> Option<ShapeHit> {
        cast_against_circle(ray, self.body_origin, self.radius + radius)
    }
}

/// Ray against a circle at `center`. A ray starting inside reports a contained hit
/// at distance zero.
pub(crate) fn cast_against_circle(ray: &RayCast, center: FixedVec2, radius: FixedNum) -> Option<ShapeHit> {
    let offset = ray.origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= FixedNum::ZERO {
        return Some(ShapeHit::contained(ray.direction));
    }

    let b = offset.dot(ray.direction);
    if b > FixedNum::ZERO {
        // Outside and heading away
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < FixedNum::ZERO {
        return None;
    }

    let t = (-b - discriminant.sqrt()).max(FixedNum::ZERO);
    if t > ray.distance {
        return None;
    }

    let normal = (ray.point_at(t) - center).normalize();
    Some(ShapeHit {
        distance: t,
        normal: if normal.is_zero() { -ray.direction } else { normal },
        contained: false,
    })
}
