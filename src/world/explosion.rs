use tracing::debug;

use super::query::BodyFilter;
use super::World;
use crate::body::{Body, BodyHandle};
use crate::error::PhysicsResult;
use crate::fixed_math::{FixedNum, FixedVec2, RayCast, TAU};

/// One target hit by one explosion ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplosionHit {
    pub body: BodyHandle,
    /// Index of the ray in `0..ray_count`, counter-clockwise from +x.
    pub ray: usize,
    pub distance: FixedNum,
    pub point: FixedVec2,
    pub normal: FixedVec2,
}

impl World {
    /// Fire `ray_count` evenly spaced rays of length `radius` from `origin`.
    ///
    /// For each ray the nearest body accepted by `occluder_filter` limits the
    /// blast. Every body accepted by `target_filter` that the same ray reaches no
    /// farther than that occluder (plus
    /// [`explosion_occluder_slop`](crate::config::WorldConfig::explosion_occluder_slop))
    /// is passed to `callback`. A target hit by several rays is reported once per
    /// ray, so callers can scale damage by coverage.
    #[allow(clippy::too_many_arguments)]
    pub fn perform_explosion(
        &self,
        origin: FixedVec2,
        radius: FixedNum,
        ray_count: usize,
        target_filter: BodyFilter<'_>,
        occluder_filter: BodyFilter<'_>,
        ticks_behind: usize,
        mut callback: impl FnMut(&ExplosionHit),
    ) -> PhysicsResult<usize> {
        self.check_history(ticks_behind)?;
        if ray_count == 0 || radius <= FixedNum::ZERO {
            return Ok(0);
        }

        let slop = self.config.explosion_occluder_slop;
        let step = TAU / FixedNum::from_num(ray_count);
        let mut reported = 0usize;

        // Candidate sets are shared by every ray
        let targets = self.query_circle(origin, radius, target_filter, ticks_behind)?;

        for ray_index in 0..ray_count {
            let direction = FixedVec2::from_angle(step * FixedNum::from_num(ray_index));
            let ray = RayCast::along(origin, direction, radius)?;

            let occlusion = self
                .ray_cast(&ray, occluder_filter, ticks_behind)?
                .map_or(radius, |hit| hit.distance);
            let reach = occlusion + slop;

            for &target in &targets {
                let only_target: &dyn Fn(&Body) -> bool = &|body| body.handle() == target;
                let Some(hit) = self.ray_cast(&ray, Some(only_target), ticks_behind)? else {
                    continue;
                };
                if hit.distance <= reach {
                    callback(&ExplosionHit {
                        body: target,
                        ray: ray_index,
                        distance: hit.distance,
                        point: hit.point,
                        normal: hit.normal,
                    });
                    reported += 1;
                }
            }
        }

        debug!(
            "[WORLD] Explosion at ({}, {}) r={} rays={}: {} hit(s) on {} target(s)",
            origin.x,
            origin.y,
            radius,
            ray_count,
            reported,
            targets.len()
        );
        Ok(reported)
    }
}
