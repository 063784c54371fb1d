//! Determinism checksums and rollback snapshots.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::World;
use crate::body::{BodyHandle, HistoryBuffer};
use crate::collections::PoolKey;
use crate::collision::{Manifold, PairKey, WarmStart};
use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{FixedNum, FixedVec2};

/// Mutable state of one body. Shapes, materials and layers are fixed at
/// creation and not part of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub position: FixedVec2,
    pub angle: FixedNum,
    pub linear_velocity: FixedVec2,
    pub angular_velocity: FixedNum,
    pub force: FixedVec2,
    pub torque: FixedNum,
    pub bias_velocity: FixedVec2,
    pub bias_rotation: FixedNum,
    pub history: HistoryBuffer,
}

/// Everything needed to rewind a world to a past tick, provided the same set of
/// bodies still exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub bodies: Vec<BodySnapshot>,
    /// Cached solver impulses per surviving shape pair, in solver order.
    pub warm_starts: Vec<(PairKey, Vec<WarmStart>)>,
    pub trigger_overlaps: Vec<(BodyHandle, BodyHandle)>,
}

impl WorldSnapshot {
    pub fn to_bytes(&self) -> PhysicsResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PhysicsError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> PhysicsResult<Self> {
        bincode::deserialize(bytes).map_err(|e| PhysicsError::Snapshot(e.to_string()))
    }
}

/// The part of a body that the checksum covers.
#[derive(Serialize)]
struct ChecksumEntry {
    handle: BodyHandle,
    position: FixedVec2,
    angle: FixedNum,
    linear_velocity: FixedVec2,
    angular_velocity: FixedNum,
}

impl World {
    /// Hash of the tick and every body's pose and velocity. Two peers that ran
    /// the same inputs agree on this value bit for bit.
    pub fn checksum(&self) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write_u64(self.tick);
        for (_, body) in self.bodies.iter() {
            let entry = ChecksumEntry {
                handle: body.handle(),
                position: body.position(),
                angle: body.angle(),
                linear_velocity: body.linear_velocity,
                angular_velocity: body.angular_velocity,
            };
            match bincode::serialize(&entry) {
                Ok(bytes) => hasher.write(&bytes),
                Err(err) => warn!("[WORLD] Failed to encode body {} for checksum: {}", entry.handle.index, err),
            }
        }
        hasher.finish()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let bodies = self
            .bodies
            .iter()
            .map(|(_, body)| BodySnapshot {
                handle: body.handle(),
                position: body.position(),
                angle: body.angle(),
                linear_velocity: body.linear_velocity,
                angular_velocity: body.angular_velocity,
                force: body.force,
                torque: body.torque,
                bias_velocity: body.bias_velocity,
                bias_rotation: body.bias_rotation,
                history: body.history().clone(),
            })
            .collect();

        let warm_starts = self
            .active_manifolds
            .iter()
            .filter_map(|&slot| self.manifolds.get_index(slot))
            .map(|manifold| (manifold.key, manifold.warm_starts(&self.contacts).to_vec()))
            .collect();

        WorldSnapshot {
            tick: self.tick,
            bodies,
            warm_starts,
            trigger_overlaps: self.trigger_overlaps.clone(),
        }
    }

    /// Rewind to `snapshot`. Fails without touching the world if any recorded
    /// body no longer exists.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) -> PhysicsResult<()> {
        if let Some(missing) = snapshot.bodies.iter().find(|b| !self.contains(b.handle)) {
            return Err(PhysicsError::BodyNotFound(missing.handle));
        }
        for (key, _) in &snapshot.warm_starts {
            for shape in [key.a, key.b] {
                let exists = self
                    .bodies
                    .get_index(shape.body)
                    .is_some_and(|body| (shape.shape as usize) < body.shapes().len());
                if !exists {
                    return Err(PhysicsError::Snapshot(format!(
                        "contact cache refers to missing shape {} of body {}",
                        shape.shape, shape.body
                    )));
                }
            }
        }

        for state in &snapshot.bodies {
            let Some(body) = self.bodies.get_mut(PoolKey::from(state.handle)) else {
                continue;
            };
            body.linear_velocity = state.linear_velocity;
            body.angular_velocity = state.angular_velocity;
            body.set_force(state.force, state.torque, state.bias_velocity, state.bias_rotation);
            body.set_pose_internal(state.position, state.angle);
            *body.history_mut() = state.history.clone();
            let (body_type, aabb) = (body.body_type(), body.aabb());
            self.broadphase.index_for_mut(body_type).insert(state.handle.index, aabb);
        }

        // Rebuild the contact cache so the next tick warm starts identically
        for &slot in &self.active_manifolds {
            if let Some(manifold) = self.manifolds.get_index_mut(slot) {
                manifold.release(&mut self.contacts);
            }
            self.manifolds.release(slot);
        }
        self.active_manifolds.clear();
        self.manifold_lookup.clear();

        let elasticity = self.config.elasticity;
        for (key, cached) in &snapshot.warm_starts {
            let (Some(body_a), Some(body_b)) = (self.bodies.get_index(key.a.body), self.bodies.get_index(key.b.body))
            else {
                continue;
            };
            let material_a = body_a.shapes()[key.a.shape as usize].material;
            let material_b = body_b.shapes()[key.b.shape as usize].material;
            let mut manifold = Manifold::new(*key, &material_a, &material_b, elasticity);
            manifold.seed(cached, &mut self.contacts, snapshot.tick);
            let slot = self.manifolds.insert(manifold).index;
            self.manifold_lookup.insert(*key, slot);
            self.active_manifolds.push(slot);
        }

        self.trigger_overlaps = snapshot.trigger_overlaps.clone();
        self.trigger_events.clear();
        self.tick = snapshot.tick;
        info!(
            "[WORLD] Restored snapshot at tick {} ({} bodies, {} cached pairs)",
            snapshot.tick,
            snapshot.bodies.len(),
            snapshot.warm_starts.len()
        );
        Ok(())
    }
}
