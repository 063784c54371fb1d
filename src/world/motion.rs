//! Kinematic sweeps.
//!
//! `move_and_collide` advances a body along `velocity * dt` until its shapes
//! would overlap an obstacle. Circle shapes are swept exactly with a circle cast.
//! Polygon shapes are sampled at steps no longer than their inradius, so no
//! obstacle can fall between two samples, and the first blocked step is tightened
//! by bisection. Overlaps no deeper than `motion_tolerance` do not block, which is
//! what lets a body that rests against a surface slide along it.

use tracing::{debug, trace};

use super::query::{cast_body, RayHit};
use super::World;
use crate::body::BodyHandle;
use crate::collision::{collide, move_filter, CollisionFilter, ContactPoint};
use crate::error::PhysicsResult;
use crate::fixed_math::{FixedNum, FixedVec2, RayCast, Transform2D};
use crate::shape::{Shape, ShapeGeometry};

/// Push-out passes attempted before a sweep starts.
const MAX_DEPENETRATION_PASSES: usize = 4;

/// Upper bound on polygon samples per sweep.
const MAX_SWEEP_STEPS: usize = 1024;

/// Earliest blocked fraction found so far, with the obstacle and the contact.
type Blocked = (FixedNum, BodyHandle, ContactPoint);

/// Where and how a sweep was stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveCollision {
    pub other: BodyHandle,
    pub point: FixedVec2,
    /// Unit normal pointing out of `other`, toward the mover.
    pub normal: FixedVec2,
    pub depth: FixedNum,
    /// Displacement actually applied.
    pub travel: FixedVec2,
    /// Requested velocity scaled by the fraction of the step not travelled.
    pub remainder: FixedVec2,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlideResult {
    /// Input velocity with every blocked component removed.
    pub velocity: FixedVec2,
    /// One entry per slide, in order.
    pub collisions: Vec<MoveCollision>,
}

impl World {
    /// Sweep `handle` along `velocity` for one tick against the bodies accepted
    /// by `filter` ([`move_filter`] by default), stopping at the first hit.
    ///
    /// A body that starts inside an obstacle is first pushed out along the
    /// contact normal.
    pub fn move_and_collide(
        &mut self,
        handle: BodyHandle,
        velocity: FixedVec2,
        filter: Option<CollisionFilter>,
    ) -> PhysicsResult<Option<MoveCollision>> {
        let filter = filter.unwrap_or(move_filter);
        self.depenetrate(handle, filter)?;

        let motion = velocity * self.config.delta_time;
        if motion.is_zero() {
            return Ok(None);
        }

        let (start, angle, outcome) = {
            let body = self.body(handle)?;
            let mut ids = Vec::new();
            self.broadphase
                .query_aabb(&body.aabb().sweep_extension(motion), &mut ids);
            let obstacles: Vec<u32> = ids
                .into_iter()
                .filter(|&id| self.bodies.get_index(id).is_some_and(|other| filter(body, other)))
                .collect();

            let outcome = self.sweep_fraction(body.shapes(), body.position(), body.facing(), motion, &obstacles);
            (body.position(), body.angle(), outcome)
        };

        let Some((fraction, other, contact)) = outcome else {
            self.set_pose(handle, start + motion, angle)?;
            trace!("[MOTION] Body {} moved freely by {:?}", handle.index, motion);
            return Ok(None);
        };

        let travel = motion * fraction;
        self.set_pose(handle, start + travel, angle)?;
        let collision = MoveCollision {
            other,
            point: contact.position,
            normal: -contact.normal,
            depth: contact.penetration,
            travel,
            remainder: velocity * (FixedNum::ONE - fraction),
        };
        debug!(
            "[MOTION] Body {} blocked by {} after {} of the step",
            handle.index, other.index, fraction
        );
        Ok(Some(collision))
    }

    /// Repeated [`World::move_and_collide`], projecting the remaining velocity
    /// onto each hit surface, for at most `max_slides` sweeps.
    pub fn move_and_slide(
        &mut self,
        handle: BodyHandle,
        velocity: FixedVec2,
        max_slides: usize,
        filter: Option<CollisionFilter>,
    ) -> PhysicsResult<SlideResult> {
        let mut result = SlideResult {
            velocity,
            collisions: Vec::new(),
        };
        let mut remaining = velocity;

        for _ in 0..max_slides {
            let Some(hit) = self.move_and_collide(handle, remaining, filter)? else {
                break;
            };
            if result.velocity.dot(hit.normal) < FixedNum::ZERO {
                result.velocity = result.velocity.slide(hit.normal);
            }
            remaining = if hit.remainder.dot(hit.normal) < FixedNum::ZERO {
                hit.remainder.slide(hit.normal)
            } else {
                hit.remainder
            };
            result.collisions.push(hit);
            if remaining.is_zero() {
                break;
            }
        }
        Ok(result)
    }

    /// Push `handle` out of whatever it overlaps deeper than the tolerance.
    fn depenetrate(&mut self, handle: BodyHandle, filter: CollisionFilter) -> PhysicsResult<()> {
        let tolerance = self.config.motion_tolerance;
        for _ in 0..MAX_DEPENETRATION_PASSES {
            let body = self.body(handle)?;
            let Some((other, _, normal, depth)) = self.deepest_overlap(body, filter) else {
                return Ok(());
            };
            if depth <= tolerance {
                return Ok(());
            }
            let (position, angle) = (body.position() + normal * depth, body.angle());
            debug!(
                "[MOTION] Body {} starts inside {} (depth {}), pushing out",
                handle.index, other.index, depth
            );
            self.set_pose(handle, position, angle)?;
        }
        Ok(())
    }

    /// First blocked fraction of `motion` in `[0, 1]`, with the obstacle and the
    /// contact found just past it.
    fn sweep_fraction(
        &self,
        shapes: &[Shape],
        start: FixedVec2,
        facing: FixedVec2,
        motion: FixedVec2,
        obstacles: &[u32],
    ) -> Option<Blocked> {
        let length = motion.length();
        if length == FixedNum::ZERO {
            return None;
        }
        let Ok(path) = RayCast::along(FixedVec2::ZERO, motion, length) else {
            return None;
        };

        // Circles that start touching an obstacle cannot be cast and are sampled
        let mut sampled = Vec::new();
        let mut best: Option<Blocked> = None;
        for shape in shapes {
            match &shape.geometry {
                ShapeGeometry::Circle(circle) => {
                    match self.cast_circle(circle.world_origin, circle.radius, &path, obstacles) {
                        CircleSweep::Clear => {}
                        CircleSweep::Hit(hit) => {
                            if best.map_or(true, |b| hit.0 < b.0) {
                                best = Some(hit);
                            }
                        }
                        CircleSweep::Touching => sampled.push(shape.clone()),
                    }
                }
                ShapeGeometry::Polygon(_) => sampled.push(shape.clone()),
            }
        }

        if !sampled.is_empty() {
            if let Some(hit) = self.sample_fraction(&mut sampled, start, facing, motion, length, obstacles) {
                if best.map_or(true, |b| hit.0 < b.0) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Cast a circle whose world center is `center` along `path`.
    ///
    /// The cast uses `radius - motion_tolerance` and stops `motion_tolerance`
    /// short of the hit, so a circle resting on a surface can still slide along it.
    fn cast_circle(&self, center: FixedVec2, radius: FixedNum, path: &RayCast, obstacles: &[u32]) -> CircleSweep {
        let tolerance = self.config.motion_tolerance;
        let shrunk = (radius - tolerance).max(FixedNum::ZERO);
        let ray = RayCast {
            origin: center,
            direction: path.direction,
            distance: path.distance,
        };

        let mut best: Option<(BodyHandle, RayHit)> = None;
        for &id in obstacles {
            let Some(other) = self.bodies.get_index(id) else {
                continue;
            };
            let Some(hit) = cast_body(other, &other.current_record(), &ray, shrunk) else {
                continue;
            };
            if hit.contained {
                return CircleSweep::Touching;
            }
            if best.map_or(true, |(_, b)| hit.distance < b.distance) {
                best = Some((other.handle(), hit));
            }
        }

        let Some((other, hit)) = best else {
            return CircleSweep::Clear;
        };
        let safe = (hit.distance - tolerance).max(FixedNum::ZERO);
        let contact = ContactPoint {
            position: hit.point - hit.normal * shrunk,
            normal: -hit.normal,
            penetration: tolerance,
            feature: 0,
        };
        CircleSweep::Hit((safe / path.distance, other, contact))
    }

    /// Sample the shapes along `motion` and bisect the first blocked step.
    fn sample_fraction(
        &self,
        shapes: &mut [Shape],
        start: FixedVec2,
        facing: FixedVec2,
        motion: FixedVec2,
        length: FixedNum,
        obstacles: &[u32],
    ) -> Option<Blocked> {
        // A shape overlaps anything it passes through for at least twice its
        // inradius of travel
        let extent = shapes.iter().map(sweep_extent).min().unwrap_or(FixedNum::ZERO);
        let needed = length
            .checked_div(extent)
            .map_or(MAX_SWEEP_STEPS, |n| n.ceil().saturating_to_num::<usize>());
        let substeps = needed.max(self.config.motion_substeps).clamp(1, MAX_SWEEP_STEPS);
        let steps = FixedNum::from_num(substeps);

        let mut safe = FixedNum::ZERO;
        let mut blocked = None;
        for k in 1..=substeps {
            let t = FixedNum::from_num(k) / steps;
            if let Some(hit) = self.blocking_contact(shapes, start + motion * t, facing, obstacles) {
                blocked = Some((t, hit));
                break;
            }
            safe = t;
        }
        let (mut high, (mut other, mut contact)) = blocked?;

        let two = FixedNum::from_num(2);
        for _ in 0..self.config.motion_bisection_steps {
            let mid = (safe + high) / two;
            match self.blocking_contact(shapes, start + motion * mid, facing, obstacles) {
                Some((hit_other, hit_contact)) => {
                    high = mid;
                    other = hit_other;
                    contact = hit_contact;
                }
                None => safe = mid,
            }
        }
        Some((safe, other, contact))
    }

    /// Deepest blocking contact with `shapes` placed at `position`.
    fn blocking_contact(
        &self,
        shapes: &mut [Shape],
        position: FixedVec2,
        facing: FixedVec2,
        obstacles: &[u32],
    ) -> Option<(BodyHandle, ContactPoint)> {
        let pose = Transform2D::from_pose(position, facing);
        for shape in shapes.iter_mut() {
            shape.apply_body_position(&pose);
        }

        let tolerance = self.config.motion_tolerance;
        let mut deepest: Option<(BodyHandle, ContactPoint)> = None;
        for &id in obstacles {
            let Some(other) = self.bodies.get_index(id) else {
                continue;
            };
            for sa in shapes.iter() {
                for sb in other.shapes() {
                    if !sa.world_aabb.overlaps(&sb.world_aabb) {
                        continue;
                    }
                    for point in collide(sa, sb) {
                        if point.penetration > tolerance
                            && deepest.map_or(true, |(_, d)| point.penetration > d.penetration)
                        {
                            deepest = Some((other.handle(), point));
                        }
                    }
                }
            }
        }
        deepest
    }
}

enum CircleSweep {
    Clear,
    Hit(Blocked),
    /// Starts overlapping an obstacle by at least the tolerance.
    Touching,
}

/// Longest step a shape can take without skipping past anything it would hit.
fn sweep_extent(shape: &Shape) -> FixedNum {
    match &shape.geometry {
        ShapeGeometry::Circle(circle) => circle.radius,
        ShapeGeometry::Polygon(polygon) => polygon.inradius(),
    }
}
