use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::circle::cast_against_circle;
use super::ShapeHit;
use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast, Transform2D, EPSILON};

/// Inline vertex capacity; larger polygons spill to the heap.
pub const INLINE_VERTICES: usize = 8;

pub type VertexList = SmallVec<[FixedVec2; INLINE_VERTICES]>;
pub type AxisList = SmallVec<[Axis; INLINE_VERTICES]>;

/// Separating axis for one polygon edge.
///
/// A point `p` is on the inner side of the edge when `normal.dot(p) <= width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub normal: FixedVec2,
    pub width: FixedNum,
}

impl Axis {
    /// Signed distance of `point` outside this edge (negative inside).
    #[inline]
    pub fn distance(&self, point: FixedVec2) -> FixedNum {
        self.normal.dot(point) - self.width
    }
}

/// Convex polygon with counter-clockwise winding.
///
/// Axis `i` belongs to the edge from vertex `i` to vertex `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub body_vertices: VertexList,
    pub body_axes: AxisList,
    pub world_vertices: VertexList,
    pub world_axes: AxisList,
}

impl Polygon {
    /// Validate and build from body-space vertices.
    pub fn new(vertices: &[FixedVec2]) -> PhysicsResult<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::DegenerateShape("polygon needs at least 3 vertices"));
        }

        let count = vertices.len();
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.x.abs() <= EPSILON && edge.y.abs() <= EPSILON {
                return Err(PhysicsError::DegenerateShape("polygon has a zero-length edge"));
            }
        }

        let twice_area = signed_twice_area(vertices);
        if twice_area == FixedNum::ZERO {
            return Err(PhysicsError::DegenerateShape("polygon has zero area"));
        }
        if twice_area < FixedNum::ZERO {
            return Err(PhysicsError::InvalidWinding);
        }

        for i in 0..count {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            let c = vertices[(i + 2) % count];
            if (b - a).cross(c - b) < FixedNum::ZERO {
                return Err(PhysicsError::DegenerateShape("polygon must be convex"));
            }
        }

        let body_vertices: VertexList = vertices.iter().copied().collect();
        let body_axes = compute_axes(&body_vertices);
        Ok(Self {
            world_vertices: body_vertices.clone(),
            world_axes: body_axes.clone(),
            body_vertices,
            body_axes,
        })
    }

    /// Axis-aligned box centered on the body origin.
    pub fn rectangle(half_width: FixedNum, half_height: FixedNum) -> PhysicsResult<Self> {
        Self::new(&[
            FixedVec2::new(-half_width, -half_height),
            FixedVec2::new(half_width, -half_height),
            FixedVec2::new(half_width, half_height),
            FixedVec2::new(-half_width, half_height),
        ])
    }

    pub fn vertex_count(&self) -> usize {
        self.body_vertices.len()
    }

    pub fn area(&self) -> FixedNum {
        signed_twice_area(&self.body_vertices) / FixedNum::from_num(2)
    }

    /// Distance from the vertex average to the nearest edge: the radius of a
    /// circle that always fits inside.
    pub fn inradius(&self) -> FixedNum {
        let count = FixedNum::from_num(self.body_vertices.len());
        let sum = self
            .body_vertices
            .iter()
            .fold(FixedVec2::ZERO, |acc, v| acc + *v);
        let center = sum / count;
        self.body_axes
            .iter()
            .map(|axis| -axis.distance(center))
            .min()
            .unwrap_or(FixedNum::ZERO)
            .max(FixedNum::ZERO)
    }

    /// Moment of inertia about the body origin for the given mass.
    pub fn inertia(&self, mass: FixedNum) -> FixedNum {
        let count = self.body_vertices.len();
        let mut numerator = FixedNum::ZERO;
        let mut denominator = FixedNum::ZERO;
        for i in 0..count {
            let a = self.body_vertices[i];
            let b = self.body_vertices[(i + 1) % count];
            let cross = a.cross(b).abs();
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross;
        }
        if denominator == FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        mass * numerator / (denominator * FixedNum::from_num(6))
    }

    pub fn body_aabb(&self) -> Aabb {
        Aabb::from_points(&self.body_vertices)
    }

    pub fn world_aabb(&self) -> Aabb {
        Aabb::from_points(&self.world_vertices)
    }

    pub fn apply_body_position(&mut self, pose: &Transform2D) {
        for (world, body) in self.world_vertices.iter_mut().zip(&self.body_vertices) {
            *world = pose.xform(*body);
        }
        for (i, (world, body)) in self.world_axes.iter_mut().zip(&self.body_axes).enumerate() {
            let normal = pose.basis_xform(body.normal);
            world.normal = normal;
            world.width = normal.dot(self.world_vertices[i]);
        }
    }

    pub fn contains_point(&self, point: FixedVec2) -> bool {
        self.body_axes.iter().all(|axis| axis.distance(point) <= FixedNum::ZERO)
    }

    pub fn overlaps_circle(&self, center: FixedVec2, radius: FixedNum) -> bool {
        if self.contains_point(center) {
            return true;
        }
        let count = self.body_vertices.len();
        (0..count).any(|i| {
            let a = self.body_vertices[i];
            let b = self.body_vertices[(i + 1) % count];
            closest_on_segment(center, a, b).distance_squared(center) <= radius * radius
        })
    }

    /// Clip the ray against every edge half-plane. Edges the ray does not oppose
    /// can only bound the exit.
    pub fn ray_cast(&self, ray: &RayCast) -> Option<ShapeHit> {
        let mut enter = FixedNum::ZERO;
        let mut exit = ray.distance;
        let mut enter_normal: Option<FixedVec2> = None;

        for axis in &self.body_axes {
            let denom = axis.normal.dot(ray.direction);
            let gap = axis.width - axis.normal.dot(ray.origin);
            if denom == FixedNum::ZERO {
                if gap < FixedNum::ZERO {
                    return None;
                }
                continue;
            }
            let t = gap / denom;
            if denom < FixedNum::ZERO {
                if t > enter {
                    enter = t;
                    enter_normal = Some(axis.normal);
                }
            } else if t < exit {
                exit = t;
            }
            if enter > exit {
                return None;
            }
        }

        match enter_normal {
            Some(normal) => Some(ShapeHit {
                distance: enter,
                normal,
                contained: false,
            }),
            None if self.contains_point(ray.origin) => Some(ShapeHit::contained(ray.direction)),
            None => None,
        }
    }

    /// Sweep a circle of `radius` along the ray.
    ///
    /// The Minkowski sum of the polygon and the circle is the union of every edge
    /// pushed out by `radius` and a circle at every vertex; the earliest of those
    /// hits is the answer.
    pub fn circle_cast(&self, ray: &RayCast, radius: FixedNum) -> Option<ShapeHit> {
        if self.overlaps_circle(ray.origin, radius) {
            return Some(ShapeHit::contained(ray.direction));
        }

        let count = self.body_vertices.len();
        let mut best: Option<ShapeHit> = None;
        let mut keep = |hit: ShapeHit| {
            if best.as_ref().map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        };

        for i in 0..count {
            let axis = self.body_axes[i];
            let denom = axis.normal.dot(ray.direction);
            if denom >= FixedNum::ZERO {
                continue;
            }
            let gap = axis.width + radius - axis.normal.dot(ray.origin);
            let t = gap / denom;
            if t < FixedNum::ZERO || t > ray.distance {
                continue;
            }
            let a = self.body_vertices[i];
            let b = self.body_vertices[(i + 1) % count];
            let tangent = b - a;
            let along = (ray.point_at(t) - axis.normal * radius - a).dot(tangent);
            if along >= FixedNum::ZERO && along <= tangent.length_squared() {
                keep(ShapeHit {
                    distance: t,
                    normal: axis.normal,
                    contained: false,
                });
            }
        }

        for vertex in &self.body_vertices {
            if let Some(hit) = cast_against_circle(ray, *vertex, radius) {
                keep(hit);
            }
        }

        best
    }
}

fn signed_twice_area(vertices: &[FixedVec2]) -> FixedNum {
    let count = vertices.len();
    (0..count).fold(FixedNum::ZERO, |acc, i| acc + vertices[i].cross(vertices[(i + 1) % count]))
}

fn compute_axes(vertices: &[FixedVec2]) -> AxisList {
    let count = vertices.len();
    (0..count)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            // Outward normal of a CCW edge points to its right
            let normal = (b - a).right().normalize();
            Axis {
                normal,
                width: normal.dot(a),
            }
        })
        .collect()
}

pub(crate) fn closest_on_segment(point: FixedVec2, a: FixedVec2, b: FixedVec2) -> FixedVec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == FixedNum::ZERO {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(FixedNum::ZERO, FixedNum::ONE);
    a + ab * t
}
