//! Collision shapes.
//!
//! A [`Shape`] belongs to exactly one body. Its geometry is stored twice: once in
//! body space (fixed at construction) and once in world space (rebuilt by
//! [`Shape::apply_body_position`] whenever the owning body moves).
//!
//! All point, circle, ray and sweep tests take body-space inputs. The world turns a
//! query into body space using the body's live or historical pose, which is how
//! lag-compensated queries avoid touching live state.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast, Transform2D};

mod circle;
mod polygon;

pub use circle::Circle;
pub use polygon::{Axis, Polygon};
pub(crate) use polygon::closest_on_segment;

/// Shape variant tag. The ordering (`Circle < Polygon`) is the canonical pair order
/// used by the narrowphase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Polygon,
}

/// Surface properties of a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub density: FixedNum,
    pub friction: FixedNum,
    pub restitution: FixedNum,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: FixedNum::ONE,
            friction: FixedNum::from_num(0.8),
            restitution: FixedNum::from_num(0.5),
        }
    }
}

/// Result of a body-space ray or sweep test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeHit {
    /// Distance travelled along the ray before contact.
    pub distance: FixedNum,
    /// Surface normal at the hit, pointing out of the shape.
    pub normal: FixedVec2,
    /// The ray (or swept circle) started inside the shape.
    pub contained: bool,
}

impl ShapeHit {
    pub(crate) fn contained(direction: FixedVec2) -> Self {
        Self {
            distance: FixedNum::ZERO,
            normal: -direction,
            contained: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Circle(Circle),
    Polygon(Polygon),
}

/// Which space a [`ShapeDef`]'s coordinates are expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeSpace {
    /// Relative to the body origin and facing.
    #[default]
    Body,
    /// Absolute world coordinates at the body's initial pose.
    World,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeDefGeometry {
    Circle { origin: FixedVec2, radius: FixedNum },
    Polygon { vertices: Vec<FixedVec2> },
}

/// Prepared shape description handed to the world factory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub geometry: ShapeDefGeometry,
    pub material: Material,
    pub space: ShapeSpace,
}

impl ShapeDef {
    pub fn circle(radius: FixedNum) -> Self {
        Self::circle_at(FixedVec2::ZERO, radius)
    }

    pub fn circle_at(origin: FixedVec2, radius: FixedNum) -> Self {
        Self {
            geometry: ShapeDefGeometry::Circle { origin, radius },
            material: Material::default(),
            space: ShapeSpace::Body,
        }
    }

    /// Counter-clockwise convex vertex ring.
    pub fn polygon(vertices: impl Into<Vec<FixedVec2>>) -> Self {
        Self {
            geometry: ShapeDefGeometry::Polygon { vertices: vertices.into() },
            material: Material::default(),
            space: ShapeSpace::Body,
        }
    }

    pub fn rectangle(half_width: FixedNum, half_height: FixedNum) -> Self {
        Self::polygon(vec![
            FixedVec2::new(-half_width, -half_height),
            FixedVec2::new(half_width, -half_height),
            FixedVec2::new(half_width, half_height),
            FixedVec2::new(-half_width, half_height),
        ])
    }

    /// Interpret the coordinates as world space at the body's initial pose.
    pub fn in_world_space(mut self) -> Self {
        self.space = ShapeSpace::World;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_density(mut self, density: FixedNum) -> Self {
        self.material.density = density;
        self
    }

    pub fn with_friction(mut self, friction: FixedNum) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: FixedNum) -> Self {
        self.material.restitution = restitution;
        self
    }
}

/// A validated shape attached to a body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub geometry: ShapeGeometry,
    pub material: Material,
    pub area: FixedNum,
    pub mass: FixedNum,
    /// About the owning body's origin.
    pub inertia: FixedNum,
    pub body_aabb: Aabb,
    pub world_aabb: Aabb,
}

impl Shape {
    /// Validate `def`, convert it to body space and compute its metrics.
    pub fn from_def(def: &ShapeDef, body_pose: &Transform2D, area_mass_ratio: FixedNum) -> PhysicsResult<Self> {
        let to_body = match def.space {
            ShapeSpace::Body => Transform2D::IDENTITY,
            ShapeSpace::World => body_pose.affine_inverse()?,
        };

        let geometry = match &def.geometry {
            ShapeDefGeometry::Circle { origin, radius } => {
                if *radius <= FixedNum::ZERO {
                    return Err(PhysicsError::DegenerateShape("circle radius must be positive"));
                }
                ShapeGeometry::Circle(Circle::new(to_body.xform(*origin), *radius))
            }
            ShapeDefGeometry::Polygon { vertices } => {
                let local: Vec<FixedVec2> = vertices.iter().map(|v| to_body.xform(*v)).collect();
                ShapeGeometry::Polygon(Polygon::new(&local)?)
            }
        };

        let mut shape = Self {
            geometry,
            material: def.material,
            area: FixedNum::ZERO,
            mass: FixedNum::ZERO,
            inertia: FixedNum::ZERO,
            body_aabb: Aabb::default(),
            world_aabb: Aabb::default(),
        };
        shape.compute_metrics(area_mass_ratio);
        shape.apply_body_position(body_pose);
        Ok(shape)
    }

    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            ShapeGeometry::Circle(_) => ShapeKind::Circle,
            ShapeGeometry::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Area, mass (`area * density * area_mass_ratio`), inertia and body-space AABB.
    pub fn compute_metrics(&mut self, area_mass_ratio: FixedNum) {
        self.area = match &self.geometry {
            ShapeGeometry::Circle(c) => c.area(),
            ShapeGeometry::Polygon(p) => p.area(),
        };
        self.mass = self.area * self.material.density * area_mass_ratio;
        self.inertia = match &self.geometry {
            ShapeGeometry::Circle(c) => c.inertia(self.mass),
            ShapeGeometry::Polygon(p) => p.inertia(self.mass),
        };
        self.body_aabb = match &self.geometry {
            ShapeGeometry::Circle(c) => c.body_aabb(),
            ShapeGeometry::Polygon(p) => p.body_aabb(),
        };
    }

    /// Re-derive world-space geometry and AABB from the owning body's pose.
    pub fn apply_body_position(&mut self, pose: &Transform2D) {
        self.world_aabb = match &mut self.geometry {
            ShapeGeometry::Circle(c) => {
                c.apply_body_position(pose);
                c.world_aabb()
            }
            ShapeGeometry::Polygon(p) => {
                p.apply_body_position(pose);
                p.world_aabb()
            }
        };
    }

    pub fn contains_point(&self, point: FixedVec2) -> bool {
        if !self.body_aabb.contains_point(point) {
            return false;
        }
        match &self.geometry {
            ShapeGeometry::Circle(c) => c.contains_point(point),
            ShapeGeometry::Polygon(p) => p.contains_point(point),
        }
    }

    pub fn overlaps_circle(&self, center: FixedVec2, radius: FixedNum) -> bool {
        if !self.body_aabb.query_circle_approx(center, radius) {
            return false;
        }
        match &self.geometry {
            ShapeGeometry::Circle(c) => c.overlaps_circle(center, radius),
            ShapeGeometry::Polygon(p) => p.overlaps_circle(center, radius),
        }
    }

    pub fn ray_cast(&self, ray: &RayCast) -> Option<ShapeHit> {
        if !self.body_aabb.ray_cast(ray) {
            return None;
        }
        match &self.geometry {
            ShapeGeometry::Circle(c) => c.ray_cast(ray),
            ShapeGeometry::Polygon(p) => p.ray_cast(ray),
        }
    }

    pub fn circle_cast(&self, ray: &RayCast, radius: FixedNum) -> Option<ShapeHit> {
        if !self.body_aabb.circle_cast(ray, radius) {
            return None;
        }
        match &self.geometry {
            ShapeGeometry::Circle(c) => c.circle_cast(ray, radius),
            ShapeGeometry::Polygon(p) => p.circle_cast(ray, radius),
        }
    }
}
