use tracing::{debug, trace};

use super::{TriggerEvent, TriggerPhase, World};
use crate::body::{Body, BodyHandle, BodyType};
use crate::collision::{collide, solver, Manifold, PairKey, ShapeRef, SolverParams};
use crate::profiling::profile;

/// Whether any shape of `a` touches any shape of `b` right now.
pub(crate) fn shapes_overlap(a: &Body, b: &Body) -> bool {
    a.shapes().iter().any(|sa| {
        b.shapes()
            .iter()
            .any(|sb| sa.world_aabb.overlaps(&sb.world_aabb) && !collide(sa, sb).is_empty())
    })
}

/// Bodies that drive pair generation. Static and kinematic bodies only ever
/// appear as the second half of a pair.
fn drives_pairs(body_type: BodyType) -> bool {
    matches!(body_type, BodyType::Dynamic | BodyType::Trigger)
}

impl World {
    /// Advance the simulation by exactly one fixed step.
    ///
    /// Forces are integrated first, then contacts are generated from the poses
    /// committed at the end of the previous tick, solved, and the bodies moved.
    /// The new poses are committed to every body's history last.
    #[profile(2)]
    pub fn update(&mut self) {
        self.tick += 1;

        self.integrate_forces();
        self.refresh_broadphase();
        self.generate_manifolds();
        self.pre_step_contacts();
        self.solve_contacts();
        let moved = self.integrate_bodies();
        self.refresh_shape_aabbs(&moved);
        self.commit_history();

        crate::profile_log!(
            self.tick,
            "[WORLD] Tick {} | Bodies: {} | Manifolds: {} | Contacts: {} | Moved: {}",
            self.tick,
            self.bodies.len(),
            self.active_manifolds.len(),
            self.contacts.len(),
            moved.len()
        );
    }

    fn integrate_forces(&mut self) {
        let gravity = self.config.gravity;
        let dt = self.config.delta_time;
        let linear_damping = self.config.linear_damping;
        let angular_damping = self.config.angular_damping;
        for body in self.bodies.values_mut() {
            body.integrate_forces(gravity, dt, linear_damping, angular_damping);
        }
    }

    /// Refit every moving body against its fat AABB.
    fn refresh_broadphase(&mut self) {
        let mut reinserted = 0usize;
        for (key, body) in self.bodies.iter() {
            if body.is_static() {
                continue;
            }
            if self.broadphase.dynamic_index.update(key.index, body.aabb()) {
                reinserted += 1;
            }
        }
        if reinserted > 0 {
            trace!("[WORLD] Tick {}: {} broadphase entries reinserted", self.tick, reinserted);
        }
    }

    #[profile(2)]
    fn generate_manifolds(&mut self) {
        let tick = self.tick;
        let filter = self.filter;
        let trigger_filter = self.trigger_filter;
        let elasticity = self.config.elasticity;

        let mut candidates = Vec::new();
        let mut next_active = Vec::with_capacity(self.active_manifolds.len());
        let mut overlaps: Vec<(BodyHandle, BodyHandle)> = Vec::new();

        for (key, body) in self.bodies.iter() {
            if !drives_pairs(body.body_type()) {
                continue;
            }
            self.broadphase.query_aabb(&body.aabb(), &mut candidates);

            for &other_index in &candidates {
                if other_index == key.index {
                    continue;
                }
                let Some(other) = self.bodies.get_index(other_index) else {
                    continue;
                };
                // Two drivers meet twice; keep the visit from the lower index
                if drives_pairs(other.body_type()) && other_index < key.index {
                    continue;
                }
                if !body.aabb().overlaps(&other.aabb()) {
                    continue;
                }

                // Trigger pairs are judged from the trigger's side only
                if body.is_trigger() || other.is_trigger() {
                    let body_sees = body.is_trigger() && trigger_filter(body, other);
                    let other_sees = other.is_trigger() && trigger_filter(other, body);
                    if (body_sees || other_sees) && shapes_overlap(body, other) {
                        if body_sees {
                            overlaps.push((body.handle(), other.handle()));
                        }
                        if other_sees {
                            overlaps.push((other.handle(), body.handle()));
                        }
                    }
                    continue;
                }

                if !filter(body, other) {
                    continue;
                }

                for (si, shape_i) in body.shapes().iter().enumerate() {
                    for (sj, shape_j) in other.shapes().iter().enumerate() {
                        if !shape_i.world_aabb.overlaps(&shape_j.world_aabb) {
                            continue;
                        }
                        let ref_i = ShapeRef {
                            kind: shape_i.kind(),
                            body: key.index,
                            shape: si as u32,
                        };
                        let ref_j = ShapeRef {
                            kind: shape_j.kind(),
                            body: other_index,
                            shape: sj as u32,
                        };
                        let pair = PairKey::new(ref_i, ref_j);
                        let (shape_a, shape_b) = if pair.a == ref_i {
                            (shape_i, shape_j)
                        } else {
                            (shape_j, shape_i)
                        };

                        let points = collide(shape_a, shape_b);
                        if points.is_empty() {
                            continue;
                        }

                        let slot = match self.manifold_lookup.get(&pair) {
                            Some(&slot) => slot,
                            None => {
                                let manifold = Manifold::new(pair, &shape_a.material, &shape_b.material, elasticity);
                                let slot = self.manifolds.insert(manifold).index;
                                self.manifold_lookup.insert(pair, slot);
                                slot
                            }
                        };
                        if let Some(manifold) = self.manifolds.get_index_mut(slot) {
                            manifold.refresh(&points, &mut self.contacts, tick);
                            next_active.push(slot);
                        }
                    }
                }
            }
        }

        // Pairs that stopped touching hand their contacts back
        let mut released = 0usize;
        for &slot in &self.active_manifolds {
            let Some(manifold) = self.manifolds.get_index_mut(slot) else {
                continue;
            };
            if manifold.seen_tick == tick {
                continue;
            }
            manifold.release(&mut self.contacts);
            let key = manifold.key;
            self.manifold_lookup.remove(&key);
            self.manifolds.release(slot);
            released += 1;
        }
        if released > 0 {
            debug!("[WORLD] Tick {}: released {} stale manifold(s)", tick, released);
        }
        self.active_manifolds = next_active;

        self.update_trigger_events(overlaps);
    }

    fn update_trigger_events(&mut self, mut overlaps: Vec<(BodyHandle, BodyHandle)>) {
        overlaps.sort_unstable();
        overlaps.dedup();

        self.trigger_events.clear();
        for &(trigger, other) in &overlaps {
            let phase = if self.trigger_overlaps.binary_search(&(trigger, other)).is_ok() {
                TriggerPhase::Stay
            } else {
                TriggerPhase::Enter
            };
            self.trigger_events.push(TriggerEvent { trigger, other, phase });
        }
        for &(trigger, other) in &self.trigger_overlaps {
            if overlaps.binary_search(&(trigger, other)).is_err() {
                self.trigger_events.push(TriggerEvent {
                    trigger,
                    other,
                    phase: TriggerPhase::Exit,
                });
            }
        }
        self.trigger_overlaps = overlaps;
    }

    fn solver_params(&self) -> SolverParams {
        SolverParams {
            resolve_slop: self.config.resolve_slop,
            resolve_rate: self.config.resolve_rate,
        }
    }

    fn pre_step_contacts(&mut self) {
        let params = self.solver_params();
        for &slot in &self.active_manifolds {
            if let Some(manifold) = self.manifolds.get_index(slot) {
                solver::pre_step(manifold, &mut self.contacts, &mut self.bodies, &params);
            }
        }
    }

    #[profile(2)]
    fn solve_contacts(&mut self) {
        for _ in 0..self.config.iterations {
            for &slot in &self.active_manifolds {
                if let Some(manifold) = self.manifolds.get_index(slot) {
                    solver::solve(manifold, &mut self.contacts, &mut self.bodies);
                }
            }
        }
    }

    /// Returns the slot indices of bodies whose pose changed.
    fn integrate_bodies(&mut self) -> Vec<u32> {
        let dt = self.config.delta_time;
        let mut moved = Vec::new();
        for body in self.bodies.values_mut() {
            if body.integrate_velocity(dt) {
                moved.push(body.handle().index);
            }
        }
        moved
    }

    /// Re-derive world geometry for moved bodies and keep the broadphase current,
    /// so queries between ticks see the new poses.
    fn refresh_shape_aabbs(&mut self, moved: &[u32]) {
        for &index in moved {
            let Some(body) = self.bodies.get_index_mut(index) else {
                continue;
            };
            body.apply_position();
            let (body_type, aabb) = (body.body_type(), body.aabb());
            self.broadphase.index_for_mut(body_type).update(index, aabb);
        }
    }

    fn commit_history(&mut self) {
        for body in self.bodies.values_mut() {
            body.record_history();
        }
    }
}
