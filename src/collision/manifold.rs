//! Pooled manifolds and contacts.
//!
//! A [`Manifold`] lives as long as its shape pair keeps overlapping. Each tick it
//! is refreshed with the narrowphase output: old contacts go back to the pool and
//! new ones are acquired, carrying the accumulated impulses over whenever the
//! feature id matches. Everything else in a [`Contact`] starts from zero.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::narrowphase::{ContactPoint, MAX_CONTACTS};
use crate::collections::Pool;
use crate::fixed_math::{FixedNum, FixedVec2};
use crate::shape::{Material, ShapeKind};

/// One shape of one body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeRef {
    pub kind: ShapeKind,
    pub body: u32,
    pub shape: u32,
}

/// Order-independent identity of a shape pair. `a` always sorts before `b`
/// (kind first, then body, then shape index), so `(x, y)` and `(y, x)` produce
/// the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub a: ShapeRef,
    pub b: ShapeRef,
}

impl PairKey {
    pub fn new(x: ShapeRef, y: ShapeRef) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn involves_body(&self, body: u32) -> bool {
        self.a.body == body || self.b.body == body
    }
}

/// Solver state for one contact point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub position: FixedVec2,
    /// From body A toward body B.
    pub normal: FixedVec2,
    pub penetration: FixedNum,
    pub feature: u32,

    pub r_a: FixedVec2,
    pub r_b: FixedVec2,
    pub tangent: FixedVec2,
    pub normal_mass: FixedNum,
    pub tangent_mass: FixedNum,
    /// Positional correction target for the bias channel.
    pub bias: FixedNum,
    /// Target separating velocity along the normal.
    pub restitution_bias: FixedNum,

    pub normal_impulse: FixedNum,
    pub tangent_impulse: FixedNum,
    pub bias_impulse: FixedNum,
}

/// Accumulated impulses of one contact, keyed by feature id. This is the only
/// per-contact state that survives from one tick to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmStart {
    pub feature: u32,
    pub normal_impulse: FixedNum,
    pub tangent_impulse: FixedNum,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifold {
    pub key: PairKey,
    pub friction: FixedNum,
    pub restitution: FixedNum,
    /// Slot indices into the world's contact pool.
    pub contacts: SmallVec<[u32; MAX_CONTACTS]>,
    /// Last tick the pair was found overlapping.
    pub seen_tick: u64,
}

impl Manifold {
    /// Friction combines as the geometric mean; restitution likewise, scaled by
    /// the world elasticity.
    pub fn new(key: PairKey, material_a: &Material, material_b: &Material, elasticity: FixedNum) -> Self {
        Self {
            key,
            friction: (material_a.friction * material_b.friction).max(FixedNum::ZERO).sqrt(),
            restitution: (material_a.restitution * material_b.restitution).max(FixedNum::ZERO).sqrt()
                * elasticity,
            contacts: SmallVec::new(),
            seen_tick: 0,
        }
    }

    pub fn body_a(&self) -> u32 {
        self.key.a.body
    }

    pub fn body_b(&self) -> u32 {
        self.key.b.body
    }

    /// Replace the contact set with `points`, keeping cached impulses for
    /// features that persisted.
    pub fn refresh(&mut self, points: &[ContactPoint], pool: &mut Pool<Contact>, tick: u64) {
        let carried = self.warm_starts(pool);
        self.release(pool);

        for point in points.iter().take(MAX_CONTACTS) {
            let key = pool.acquire();
            let Some(contact) = pool.get_mut(key) else {
                continue;
            };
            contact.position = point.position;
            contact.normal = point.normal;
            contact.penetration = point.penetration;
            contact.feature = point.feature;
            if let Some(cached) = carried.iter().find(|c| c.feature == point.feature) {
                contact.normal_impulse = cached.normal_impulse;
                contact.tangent_impulse = cached.tangent_impulse;
            }
            self.contacts.push(key.index);
        }
        self.seen_tick = tick;
    }

    /// Cached impulses of the current contacts.
    pub fn warm_starts(&self, pool: &Pool<Contact>) -> SmallVec<[WarmStart; MAX_CONTACTS]> {
        self.contacts
            .iter()
            .filter_map(|&index| pool.get_index(index))
            .map(|c| WarmStart {
                feature: c.feature,
                normal_impulse: c.normal_impulse,
                tangent_impulse: c.tangent_impulse,
            })
            .collect()
    }

    /// Rebuild placeholder contacts that only carry cached impulses, so the next
    /// [`Manifold::refresh`] warm starts from them.
    pub fn seed(&mut self, warm_starts: &[WarmStart], pool: &mut Pool<Contact>, tick: u64) {
        self.release(pool);
        for cached in warm_starts.iter().take(MAX_CONTACTS) {
            let key = pool.acquire();
            if let Some(contact) = pool.get_mut(key) {
                contact.feature = cached.feature;
                contact.normal_impulse = cached.normal_impulse;
                contact.tangent_impulse = cached.tangent_impulse;
                self.contacts.push(key.index);
            }
        }
        self.seen_tick = tick;
    }

    /// Return every contact to the pool.
    pub fn release(&mut self, pool: &mut Pool<Contact>) {
        for index in self.contacts.drain(..) {
            pool.release(index);
        }
    }
}
