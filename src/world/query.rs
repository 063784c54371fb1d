//! Spatial queries against live or historical poses.
//!
//! Every query takes an optional body predicate and a `ticks_behind` offset.
//! With `ticks_behind == 0` candidates come from the broadphase and the live pose
//! is tested. With a positive offset each body's recorded AABB and pose from that
//! tick stand in for the live ones; bodies created after that tick are skipped.
//! Nothing here mutates the world.

use crate::body::{Body, BodyHandle, HistoryRecord};
use crate::broadphase::Broadphase;
use crate::collision::{collide, CollisionFilter};
use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast};
use crate::shape::ShapeHit;

use super::step::shapes_overlap;
use super::World;

/// Optional per-body predicate accepted by every query.
pub type BodyFilter<'a> = Option<&'a dyn Fn(&Body) -> bool>;

/// Nearest hit of a ray or swept circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayHit {
    pub body: BodyHandle,
    /// Distance along the ray.
    pub distance: FixedNum,
    /// World-space point on the ray's path where the hit happened (the swept
    /// circle's center for circle casts).
    pub point: FixedVec2,
    /// World-space surface normal, pointing back toward the ray origin side.
    pub normal: FixedVec2,
    /// The ray started inside the body.
    pub contained: bool,
}

fn accepts(filter: BodyFilter<'_>, body: &Body) -> bool {
    filter.map_or(true, |f| f(body))
}

impl World {
    /// Bodies (and their pose records) that might touch `bounds` at the given
    /// offset, in ascending slot order. `live` fills the ids from the broadphase
    /// when `ticks_behind == 0`.
    fn candidates(
        &self,
        bounds: &Aabb,
        ticks_behind: usize,
        live: impl FnOnce(&Broadphase, &mut Vec<u32>),
    ) -> Vec<(&Body, HistoryRecord)> {
        if ticks_behind == 0 {
            let mut ids = Vec::new();
            live(&self.broadphase, &mut ids);
            return ids
                .into_iter()
                .filter_map(|id| self.bodies.get_index(id))
                .map(|body| (body, body.current_record()))
                .collect();
        }

        // Past AABBs are not indexed; scan the recorded ones
        self.bodies
            .iter()
            .filter_map(|(_, body)| body.record_at(ticks_behind).map(|record| (body, record)))
            .filter(|(_, record)| record.aabb.overlaps(bounds))
            .collect()
    }

    /// Bodies with a shape containing `point`.
    pub fn query_point(
        &self,
        point: FixedVec2,
        filter: BodyFilter<'_>,
        ticks_behind: usize,
    ) -> PhysicsResult<Vec<BodyHandle>> {
        self.check_history(ticks_behind)?;
        let bounds = Aabb::from_circle(point, FixedNum::ZERO);
        let mut hits = Vec::new();
        let live = |broadphase: &Broadphase, ids: &mut Vec<u32>| broadphase.query_aabb(&bounds, ids);
        for (body, record) in self.candidates(&bounds, ticks_behind, live) {
            if !accepts(filter, body) || !record.aabb.contains_point(point) {
                continue;
            }
            let local = record.pose().xform_inv(point);
            if body.shapes().iter().any(|shape| shape.contains_point(local)) {
                hits.push(body.handle());
            }
        }
        Ok(hits)
    }

    /// Bodies with a shape overlapping the circle.
    pub fn query_circle(
        &self,
        center: FixedVec2,
        radius: FixedNum,
        filter: BodyFilter<'_>,
        ticks_behind: usize,
    ) -> PhysicsResult<Vec<BodyHandle>> {
        self.check_history(ticks_behind)?;
        let bounds = Aabb::from_circle(center, radius);
        let mut hits = Vec::new();
        let live = |broadphase: &Broadphase, ids: &mut Vec<u32>| broadphase.query_circle(center, radius, ids);
        for (body, record) in self.candidates(&bounds, ticks_behind, live) {
            if !accepts(filter, body) || !record.aabb.query_circle_approx(center, radius) {
                continue;
            }
            let local = record.pose().xform_inv(center);
            if body.shapes().iter().any(|shape| shape.overlaps_circle(local, radius)) {
                hits.push(body.handle());
            }
        }
        Ok(hits)
    }

    /// Nearest body hit by `ray`.
    pub fn ray_cast(&self, ray: &RayCast, filter: BodyFilter<'_>, ticks_behind: usize) -> PhysicsResult<Option<RayHit>> {
        self.sweep(ray, FixedNum::ZERO, filter, ticks_behind)
    }

    /// Nearest body hit by a circle of `radius` swept along `ray`.
    pub fn circle_cast(
        &self,
        ray: &RayCast,
        radius: FixedNum,
        filter: BodyFilter<'_>,
        ticks_behind: usize,
    ) -> PhysicsResult<Option<RayHit>> {
        if radius < FixedNum::ZERO {
            return Err(PhysicsError::DegenerateShape("cast radius must not be negative"));
        }
        self.sweep(ray, radius, filter, ticks_behind)
    }

    fn sweep(
        &self,
        ray: &RayCast,
        radius: FixedNum,
        filter: BodyFilter<'_>,
        ticks_behind: usize,
    ) -> PhysicsResult<Option<RayHit>> {
        self.check_history(ticks_behind)?;
        let bounds = Aabb::from_points(&[ray.origin, ray.end()]).expand(radius);

        let mut best: Option<RayHit> = None;
        let live = |broadphase: &Broadphase, ids: &mut Vec<u32>| broadphase.query_ray(ray, radius, ids);
        for (body, record) in self.candidates(&bounds, ticks_behind, live) {
            if !accepts(filter, body) || !record.aabb.circle_cast(ray, radius) {
                continue;
            }
            let Some(hit) = cast_body(body, &record, ray, radius) else {
                continue;
            };
            // Strict comparison keeps the lowest slot on ties
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        }
        Ok(best)
    }

    /// Every body currently overlapping `trigger` and accepted by `filter`
    /// (usually [`trigger_query_filter`](crate::collision::trigger_query_filter)).
    pub fn query_trigger(&self, trigger: BodyHandle, filter: CollisionFilter) -> PhysicsResult<Vec<BodyHandle>> {
        let trigger_body = self.body(trigger)?;
        let mut ids = Vec::new();
        self.broadphase.query_aabb(&trigger_body.aabb(), &mut ids);

        let mut hits = Vec::new();
        for id in ids {
            let Some(other) = self.bodies.get_index(id) else {
                continue;
            };
            if !filter(trigger_body, other) || !trigger_body.aabb().overlaps(&other.aabb()) {
                continue;
            }
            if shapes_overlap(trigger_body, other) {
                hits.push(other.handle());
            }
        }
        Ok(hits)
    }

    /// Deepest contact between `body`'s shapes and anything accepted by `filter`,
    /// as `(other, point, normal out of other, depth)`.
    pub(crate) fn deepest_overlap(
        &self,
        body: &Body,
        filter: CollisionFilter,
    ) -> Option<(BodyHandle, FixedVec2, FixedVec2, FixedNum)> {
        let mut ids = Vec::new();
        self.broadphase.query_aabb(&body.aabb(), &mut ids);

        let mut deepest: Option<(BodyHandle, FixedVec2, FixedVec2, FixedNum)> = None;
        for id in ids {
            let Some(other) = self.bodies.get_index(id) else {
                continue;
            };
            if !filter(body, other) {
                continue;
            }
            for sa in body.shapes() {
                for sb in other.shapes() {
                    if !sa.world_aabb.overlaps(&sb.world_aabb) {
                        continue;
                    }
                    for point in collide(sa, sb) {
                        if deepest.map_or(true, |d| point.penetration > d.3) {
                            deepest = Some((other.handle(), point.position, -point.normal, point.penetration));
                        }
                    }
                }
            }
        }
        deepest
    }
}

/// Cast against every shape of `body` posed at `record`; nearest hit wins.
pub(super) fn cast_body(body: &Body, record: &HistoryRecord, ray: &RayCast, radius: FixedNum) -> Option<RayHit> {
    let pose = record.pose();
    let local_ray = RayCast {
        origin: pose.xform_inv(ray.origin),
        direction: pose.basis_xform_inv(ray.direction),
        distance: ray.distance,
    };

    let mut best: Option<ShapeHit> = None;
    for shape in body.shapes() {
        let hit = if radius > FixedNum::ZERO {
            shape.circle_cast(&local_ray, radius)
        } else {
            shape.ray_cast(&local_ray)
        };
        if let Some(hit) = hit {
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        }
    }

    best.map(|hit| RayHit {
        body: body.handle(),
        distance: hit.distance,
        point: ray.point_at(hit.distance),
        normal: pose.basis_xform(hit.normal),
        contained: hit.contained,
    })
}
