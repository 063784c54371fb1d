//! The simulation world.
//!
//! [`World`] owns every body, both broadphase indices, the manifold and contact
//! pools and its own [`WorldConfig`]. All mutation goes through `&mut World`;
//! queries take `&World` and never touch live state.
//!
//! Module layout:
//! - `step`: the fixed tick pipeline ([`World::update`])
//! - `query`: point, circle, ray and sweep queries, live or historical
//! - `explosion`: radial multi-ray queries
//! - `motion`: kinematic `move_and_collide` / `move_and_slide`
//! - `snapshot`: checksums and rollback snapshots

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::body::{Body, BodyDef, BodyHandle, BodyType};
use crate::broadphase::Broadphase;
use crate::collections::{Pool, PoolKey};
use crate::collision::{trigger_query_filter, world_filter, CollisionFilter, Contact, Manifold, PairKey};
use crate::config::WorldConfig;
use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{FixedNum, FixedVec2};
use crate::shape::ShapeDef;

mod explosion;
mod motion;
mod query;
mod snapshot;
mod step;

#[cfg(test)]
mod tests;

pub use explosion::ExplosionHit;
pub use motion::{MoveCollision, SlideResult};
pub use query::{BodyFilter, RayHit};
pub use snapshot::{BodySnapshot, WorldSnapshot};

/// Whether a trigger overlap started, continued or ended this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerPhase {
    Enter,
    Stay,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub trigger: BodyHandle,
    pub other: BodyHandle,
    pub phase: TriggerPhase,
}

/// Read-only view of one solved contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactReport {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub position: FixedVec2,
    /// From `body_a` toward `body_b`.
    pub normal: FixedVec2,
    pub penetration: FixedNum,
    pub normal_impulse: FixedNum,
    pub tangent_impulse: FixedNum,
}

pub struct World {
    config: WorldConfig,
    bodies: Pool<Body>,
    broadphase: Broadphase,
    /// Number of completed ticks.
    tick: u64,

    manifolds: Pool<Manifold>,
    contacts: Pool<Contact>,
    manifold_lookup: FxHashMap<PairKey, u32>,
    /// Manifold slots in generation order. Solver order follows this list.
    active_manifolds: Vec<u32>,

    /// Sorted `(trigger, other)` overlaps seen during the last tick.
    trigger_overlaps: Vec<(BodyHandle, BodyHandle)>,
    trigger_events: Vec<TriggerEvent>,

    filter: CollisionFilter,
    /// Called as `(trigger, other)` for every candidate overlap of a trigger.
    trigger_filter: CollisionFilter,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        info!(
            "[WORLD] Created world: dt={} iterations={} history={} cell_size={}",
            config.delta_time, config.iterations, config.history_length, config.broadphase_cell_size
        );
        Self {
            broadphase: Broadphase::new(config.broadphase_cell_size, config.dynamic_aabb_margin),
            config,
            bodies: Pool::new(),
            tick: 0,
            manifolds: Pool::new(),
            contacts: Pool::new(),
            manifold_lookup: FxHashMap::default(),
            active_manifolds: Vec::new(),
            trigger_overlaps: Vec::new(),
            trigger_events: Vec::new(),
            filter: world_filter,
            trigger_filter: trigger_query_filter,
        }
    }

    /// Replace the pair filter used by manifold generation. Defaults to
    /// [`world_filter`].
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn set_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }

    /// Replace the filter deciding which overlaps a trigger reports. Defaults to
    /// [`trigger_query_filter`].
    pub fn set_trigger_filter(&mut self, filter: CollisionFilter) {
        self.trigger_filter = filter;
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn delta_time(&self) -> FixedNum {
        self.config.delta_time
    }

    pub fn broadphase(&self) -> &Broadphase {
        &self.broadphase
    }

    // ========================================================================
    // Factory
    // ========================================================================

    /// Create a body. Its current pose becomes the first history record.
    pub fn create_body(&mut self, def: BodyDef) -> PhysicsResult<BodyHandle> {
        let handle: BodyHandle = self.bodies.next_key().into();
        let body = Body::from_def(handle, &def, self.config.area_mass_ratio, self.config.history_length)?;
        let aabb = body.aabb();
        let key = self.bodies.insert(body);
        debug_assert_eq!(BodyHandle::from(key), handle);

        self.broadphase.index_for_mut(def.body_type).insert(handle.index, aabb);
        debug!(
            "[WORLD] Created {:?} body {} (gen {}) with {} shape(s)",
            def.body_type,
            handle.index,
            handle.generation,
            def.shapes.len()
        );
        Ok(handle)
    }

    pub fn create_static(
        &mut self,
        position: FixedVec2,
        angle: FixedNum,
        shapes: impl IntoIterator<Item = ShapeDef>,
    ) -> PhysicsResult<BodyHandle> {
        self.create_body(BodyDef::new(BodyType::Static).at(position).with_angle(angle).with_shapes(shapes))
    }

    pub fn create_kinematic(
        &mut self,
        position: FixedVec2,
        angle: FixedNum,
        shapes: impl IntoIterator<Item = ShapeDef>,
    ) -> PhysicsResult<BodyHandle> {
        self.create_body(BodyDef::new(BodyType::Kinematic).at(position).with_angle(angle).with_shapes(shapes))
    }

    pub fn create_dynamic(
        &mut self,
        position: FixedVec2,
        angle: FixedNum,
        shapes: impl IntoIterator<Item = ShapeDef>,
    ) -> PhysicsResult<BodyHandle> {
        self.create_body(BodyDef::new(BodyType::Dynamic).at(position).with_angle(angle).with_shapes(shapes))
    }

    pub fn create_trigger(
        &mut self,
        position: FixedVec2,
        angle: FixedNum,
        shapes: impl IntoIterator<Item = ShapeDef>,
    ) -> PhysicsResult<BodyHandle> {
        self.create_body(BodyDef::new(BodyType::Trigger).at(position).with_angle(angle).with_shapes(shapes))
    }

    /// Remove a body, its broadphase entry, its manifolds and its trigger state.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> PhysicsResult<Body> {
        let key = PoolKey::from(handle);
        let body = self.bodies.remove(key).ok_or(PhysicsError::BodyNotFound(handle))?;

        self.broadphase.index_for_mut(body.body_type()).remove(handle.index);
        self.drop_manifolds_of(handle.index);
        self.trigger_overlaps
            .retain(|(trigger, other)| *trigger != handle && *other != handle);

        debug!("[WORLD] Destroyed body {} (gen {})", handle.index, handle.generation);
        Ok(body)
    }

    fn drop_manifolds_of(&mut self, body_index: u32) {
        let manifolds = &mut self.manifolds;
        let contacts = &mut self.contacts;
        let lookup = &mut self.manifold_lookup;
        self.active_manifolds.retain(|&slot| {
            let Some(manifold) = manifolds.get_index_mut(slot) else {
                return false;
            };
            if !manifold.key.involves_body(body_index) {
                return true;
            }
            manifold.release(contacts);
            lookup.remove(&manifold.key);
            manifolds.release(slot);
            false
        });
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn body(&self, handle: BodyHandle) -> PhysicsResult<&Body> {
        self.bodies.get(handle.into()).ok_or(PhysicsError::BodyNotFound(handle))
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> PhysicsResult<&mut Body> {
        self.bodies.get_mut(handle.into()).ok_or(PhysicsError::BodyNotFound(handle))
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.into())
    }

    /// Live bodies in ascending slot order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.iter().map(|(_, body)| body)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Teleport a body. Velocities are kept; history is untouched until the next
    /// commit.
    pub fn set_pose(&mut self, handle: BodyHandle, position: FixedVec2, angle: FixedNum) -> PhysicsResult<()> {
        let body = self
            .bodies
            .get_mut(handle.into())
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        body.set_pose_internal(position, angle);
        let (body_type, aabb) = (body.body_type(), body.aabb());

        // Static entries carry no margin, so they are always reinserted
        match body_type {
            BodyType::Static => self.broadphase.static_index.insert(handle.index, aabb),
            _ => {
                self.broadphase.dynamic_index.update(handle.index, aabb);
            }
        }
        Ok(())
    }

    /// Set linear and angular velocity.
    pub fn set_velocity(&mut self, handle: BodyHandle, linear: FixedVec2, angular: FixedNum) -> PhysicsResult<()> {
        self.body_mut(handle)?.set_velocity(linear, angular);
        Ok(())
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Trigger events produced by the last [`World::update`].
    pub fn trigger_events(&self) -> &[TriggerEvent] {
        &self.trigger_events
    }

    /// Number of manifolds that survived the last tick.
    pub fn manifold_count(&self) -> usize {
        self.active_manifolds.len()
    }

    /// Every contact solved during the last tick, in solver order.
    pub fn contact_reports(&self) -> Vec<ContactReport> {
        let mut reports = Vec::new();
        for &slot in &self.active_manifolds {
            let Some(manifold) = self.manifolds.get_index(slot) else {
                continue;
            };
            let (Some(a), Some(b)) = (
                self.bodies.get_index(manifold.body_a()),
                self.bodies.get_index(manifold.body_b()),
            ) else {
                continue;
            };
            for &index in &manifold.contacts {
                if let Some(contact) = self.contacts.get_index(index) {
                    reports.push(ContactReport {
                        body_a: a.handle(),
                        body_b: b.handle(),
                        position: contact.position,
                        normal: contact.normal,
                        penetration: contact.penetration,
                        normal_impulse: contact.normal_impulse,
                        tangent_impulse: contact.tangent_impulse,
                    });
                }
            }
        }
        reports
    }

    /// Checked conversion of `ticks_behind` against the retained window.
    pub(crate) fn check_history(&self, ticks_behind: usize) -> PhysicsResult<()> {
        if ticks_behind > self.config.history_length {
            return Err(PhysicsError::HistoryOutOfRange {
                requested: ticks_behind,
                retained: self.config.history_length,
            });
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("bodies", &self.bodies.len())
            .field("manifolds", &self.active_manifolds.len())
            .field("contacts", &self.contacts.len())
            .finish()
    }
}
