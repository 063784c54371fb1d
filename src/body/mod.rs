//! Rigid bodies.
//!
//! A [`Body`] owns one or more [`Shape`]s and aggregates their mass and inertia.
//! Bodies are created through the [`World`](crate::world::World) factory and
//! addressed by generational [`BodyHandle`]s, so a handle kept after
//! `destroy_body` never aliases a newer body.

use serde::{Deserialize, Serialize};

use crate::collections::PoolKey;
use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{wrap_angle, Aabb, FixedNum, FixedVec2, Transform2D};
use crate::shape::{Shape, ShapeDef};

mod history;

pub use history::{HistoryBuffer, HistoryRecord};

// ============================================================================
// Identity & Category
// ============================================================================

/// Collision layers. A body collides with another when its `mask` shares a bit
/// with the other's `layer`.
pub mod layers {
    pub const NONE: u32 = 0;
    pub const DEFAULT: u32 = 1 << 0;
    pub const STATIC: u32 = 1 << 1;
    pub const PROJECTILE: u32 = 1 << 2;
    pub const ALL: u32 = u32::MAX;
}

/// Stable reference to a body inside one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

impl From<PoolKey> for BodyHandle {
    fn from(key: PoolKey) -> Self {
        Self {
            index: key.index,
            generation: key.generation,
        }
    }
}

impl From<BodyHandle> for PoolKey {
    fn from(handle: BodyHandle) -> Self {
        Self {
            index: handle.index,
            generation: handle.generation,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves. Indexed once in the static broadphase.
    Static,
    /// Moves by its velocity only; infinite mass.
    Kinematic,
    /// Integrates forces and responds to contact impulses.
    Dynamic,
    /// Reports overlaps, never exerts or receives impulses.
    Trigger,
}

// ============================================================================
// Definition
// ============================================================================

/// Everything needed to create a body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: FixedVec2,
    pub angle: FixedNum,
    pub shapes: Vec<ShapeDef>,
    pub layer: u32,
    pub mask: u32,
    pub user_data: u64,
}

impl BodyDef {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: FixedVec2::ZERO,
            angle: FixedNum::ZERO,
            shapes: Vec::new(),
            layer: layers::DEFAULT,
            mask: layers::ALL,
            user_data: 0,
        }
    }

    pub fn at(mut self, position: FixedVec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: FixedNum) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_shape(mut self, shape: ShapeDef) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn with_shapes(mut self, shapes: impl IntoIterator<Item = ShapeDef>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn with_layers(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }
}

// ============================================================================
// Body
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    handle: BodyHandle,
    body_type: BodyType,

    position: FixedVec2,
    angle: FixedNum,
    facing: FixedVec2,

    pub linear_velocity: FixedVec2,
    pub angular_velocity: FixedNum,
    pub force: FixedVec2,
    pub torque: FixedNum,
    /// Positional correction applied once at the next integration, then cleared.
    pub bias_velocity: FixedVec2,
    pub bias_rotation: FixedNum,

    mass: FixedNum,
    inv_mass: FixedNum,
    inertia: FixedNum,
    inv_inertia: FixedNum,

    pub layer: u32,
    pub mask: u32,
    pub user_data: u64,

    shapes: Vec<Shape>,
    aabb: Aabb,
    history: HistoryBuffer,
}

impl Body {
    /// Build from a definition. The history ring holds `history_length + 1`
    /// records so that `history_length` ticks behind is still answerable.
    pub(crate) fn from_def(
        handle: BodyHandle,
        def: &BodyDef,
        area_mass_ratio: FixedNum,
        history_length: usize,
    ) -> PhysicsResult<Self> {
        if def.shapes.is_empty() {
            return Err(PhysicsError::EmptyBody);
        }

        let angle = wrap_angle(def.angle);
        let facing = FixedVec2::from_angle(angle);
        let pose = Transform2D::from_pose(def.position, facing);
        let shapes = def
            .shapes
            .iter()
            .map(|shape| Shape::from_def(shape, &pose, area_mass_ratio))
            .collect::<PhysicsResult<Vec<_>>>()?;

        let mut body = Self {
            handle,
            body_type: def.body_type,
            position: def.position,
            angle,
            facing,
            linear_velocity: FixedVec2::ZERO,
            angular_velocity: FixedNum::ZERO,
            force: FixedVec2::ZERO,
            torque: FixedNum::ZERO,
            bias_velocity: FixedVec2::ZERO,
            bias_rotation: FixedNum::ZERO,
            mass: FixedNum::ZERO,
            inv_mass: FixedNum::ZERO,
            inertia: FixedNum::ZERO,
            inv_inertia: FixedNum::ZERO,
            layer: def.layer,
            mask: def.mask,
            user_data: def.user_data,
            shapes,
            aabb: Aabb::default(),
            history: HistoryBuffer::new(history_length + 1),
        };
        body.compute_mass();
        body.apply_position();
        body.record_history();
        Ok(body)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn is_trigger(&self) -> bool {
        self.body_type == BodyType::Trigger
    }

    pub fn position(&self) -> FixedVec2 {
        self.position
    }

    pub fn angle(&self) -> FixedNum {
        self.angle
    }

    /// Unit vector `(cos angle, sin angle)`.
    pub fn facing(&self) -> FixedVec2 {
        self.facing
    }

    pub fn pose(&self) -> Transform2D {
        Transform2D::from_pose(self.position, self.facing)
    }

    pub fn mass(&self) -> FixedNum {
        self.mass
    }

    pub fn inv_mass(&self) -> FixedNum {
        self.inv_mass
    }

    pub fn inertia(&self) -> FixedNum {
        self.inertia
    }

    pub fn inv_inertia(&self) -> FixedNum {
        self.inv_inertia
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Union of all world-space shape AABBs.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    pub fn set_velocity(&mut self, linear: FixedVec2, angular: FixedNum) {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
    }

    /// Accumulate a force through the center. Cleared after integration.
    pub fn add_force(&mut self, force: FixedVec2) {
        self.force += force;
    }

    /// Accumulate a force applied at a world-space point, producing torque about
    /// the body origin.
    pub fn add_force_at_point(&mut self, force: FixedVec2, point: FixedVec2) {
        self.force += force;
        self.torque += (point - self.position).cross(force);
    }

    pub fn add_torque(&mut self, torque: FixedNum) {
        self.torque += torque;
    }

    /// Overwrite the force accumulators and the positional bias directly.
    pub fn set_force(&mut self, force: FixedVec2, torque: FixedNum, bias_velocity: FixedVec2, bias_rotation: FixedNum) {
        self.force = force;
        self.torque = torque;
        self.bias_velocity = bias_velocity;
        self.bias_rotation = bias_rotation;
    }

    // ------------------------------------------------------------------------
    // Simulation internals
    // ------------------------------------------------------------------------

    fn compute_mass(&mut self) {
        self.mass = self.shapes.iter().fold(FixedNum::ZERO, |acc, s| acc + s.mass);
        self.inertia = self.shapes.iter().fold(FixedNum::ZERO, |acc, s| acc + s.inertia);

        // Only dynamic bodies respond to impulses
        let dynamic = self.body_type == BodyType::Dynamic;
        self.inv_mass = if dynamic && self.mass > FixedNum::ZERO {
            FixedNum::ONE / self.mass
        } else {
            FixedNum::ZERO
        };
        self.inv_inertia = if dynamic && self.inertia > FixedNum::ZERO {
            FixedNum::ONE / self.inertia
        } else {
            FixedNum::ZERO
        };
    }

    /// Re-derive every shape's world geometry and the body AABB from the pose.
    pub(crate) fn apply_position(&mut self) {
        let pose = self.pose();
        let mut aabb: Option<Aabb> = None;
        for shape in &mut self.shapes {
            shape.apply_body_position(&pose);
            aabb = Some(match aabb {
                Some(acc) => acc.merge(&shape.world_aabb),
                None => shape.world_aabb,
            });
        }
        self.aabb = aabb.unwrap_or_default();
    }

    pub(crate) fn set_pose_internal(&mut self, position: FixedVec2, angle: FixedNum) {
        self.position = position;
        self.angle = wrap_angle(angle);
        self.facing = FixedVec2::from_angle(self.angle);
        self.apply_position();
    }

    /// Velocity update from accumulated force, torque and gravity, then damping.
    pub(crate) fn integrate_forces(
        &mut self,
        gravity: FixedVec2,
        dt: FixedNum,
        linear_damping: FixedNum,
        angular_damping: FixedNum,
    ) {
        if self.body_type == BodyType::Dynamic {
            self.linear_velocity += (gravity + self.force * self.inv_mass) * dt;
            self.angular_velocity += self.torque * self.inv_inertia * dt;
            self.linear_velocity = self.linear_velocity * linear_damping;
            self.angular_velocity *= angular_damping;
        }
        self.force = FixedVec2::ZERO;
        self.torque = FixedNum::ZERO;
    }

    /// Advance the pose by velocity and any pending bias. Returns whether the
    /// pose changed.
    pub(crate) fn integrate_velocity(&mut self, dt: FixedNum) -> bool {
        if self.body_type == BodyType::Static {
            self.bias_velocity = FixedVec2::ZERO;
            self.bias_rotation = FixedNum::ZERO;
            return false;
        }

        let delta = self.linear_velocity * dt + self.bias_velocity;
        let spin = self.angular_velocity * dt + self.bias_rotation;
        self.bias_velocity = FixedVec2::ZERO;
        self.bias_rotation = FixedNum::ZERO;

        if delta.is_zero() && spin == FixedNum::ZERO {
            return false;
        }
        self.position += delta;
        if spin != FixedNum::ZERO {
            self.angle = wrap_angle(self.angle + spin);
            self.facing = FixedVec2::from_angle(self.angle);
        }
        true
    }

    // ------------------------------------------------------------------------
    // Impulses
    // ------------------------------------------------------------------------

    /// Apply `impulse` at lever arm `r` (world offset from the body origin).
    #[inline]
    pub(crate) fn apply_impulse(&mut self, impulse: FixedVec2, r: FixedVec2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * r.cross(impulse);
    }

    #[inline]
    pub(crate) fn apply_bias(&mut self, impulse: FixedVec2, r: FixedVec2) {
        self.bias_velocity += impulse * self.inv_mass;
        self.bias_rotation += self.inv_inertia * r.cross(impulse);
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub(crate) fn current_record(&self) -> HistoryRecord {
        HistoryRecord {
            position: self.position,
            angle: self.angle,
            facing: self.facing,
            aabb: self.aabb,
        }
    }

    pub(crate) fn record_history(&mut self) {
        let record = self.current_record();
        self.history.push(record);
    }

    pub(crate) fn history_mut(&mut self) -> &mut HistoryBuffer {
        &mut self.history
    }

    /// Pose record `ticks_behind` commits ago; 0 is the live pose. `None` when the
    /// body did not exist yet at that tick.
    pub fn record_at(&self, ticks_behind: usize) -> Option<HistoryRecord> {
        if ticks_behind == 0 {
            return Some(self.current_record());
        }
        self.history.get(ticks_behind).copied()
    }
}
