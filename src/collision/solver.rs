//! Sequential-impulse contact solver.
//!
//! Each tick runs [`pre_step`] once over every manifold and then [`solve`]
//! `iterations` times. Three impulse channels are accumulated per contact:
//!
//! - **bias**: pushes overlapping bodies apart through the bodies' bias
//!   accumulators only, so positional correction never adds kinetic energy
//! - **normal**: non-negative, warm-started from the previous tick
//! - **tangent**: Coulomb friction, clamped to `friction * normal`

use super::manifold::{Contact, Manifold};
use crate::body::Body;
use crate::collections::Pool;
use crate::fixed_math::{FixedNum, FixedVec2};

/// Approach speeds below this do not bounce, so resting contacts stay at rest.
pub const RESTITUTION_THRESHOLD: FixedNum = FixedNum::ONE;

/// Per-world solver tuning copied out of the world configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverParams {
    /// Penetration tolerated before the bias channel engages.
    pub resolve_slop: FixedNum,
    /// Fraction of the remaining penetration corrected per tick.
    pub resolve_rate: FixedNum,
}

fn effective_mass(a: &Body, b: &Body, r_a: FixedVec2, r_b: FixedVec2, axis: FixedVec2) -> FixedNum {
    let ra_n = r_a.cross(axis);
    let rb_n = r_b.cross(axis);
    let k = a.inv_mass() + b.inv_mass() + a.inv_inertia() * ra_n * ra_n + b.inv_inertia() * rb_n * rb_n;
    if k > FixedNum::ZERO {
        FixedNum::ONE / k
    } else {
        FixedNum::ZERO
    }
}

fn relative_velocity(a: &Body, b: &Body, r_a: FixedVec2, r_b: FixedVec2) -> FixedVec2 {
    (b.linear_velocity + FixedVec2::cross_scalar(b.angular_velocity, r_b))
        - (a.linear_velocity + FixedVec2::cross_scalar(a.angular_velocity, r_a))
}

fn relative_bias_velocity(a: &Body, b: &Body, r_a: FixedVec2, r_b: FixedVec2) -> FixedVec2 {
    (b.bias_velocity + FixedVec2::cross_scalar(b.bias_rotation, r_b))
        - (a.bias_velocity + FixedVec2::cross_scalar(a.bias_rotation, r_a))
}

impl Contact {
    /// Recompute lever arms, effective masses and targets from the current pose,
    /// then apply the cached impulses.
    pub fn pre_step(&mut self, a: &mut Body, b: &mut Body, restitution: FixedNum, params: &SolverParams) {
        self.r_a = self.position - a.position();
        self.r_b = self.position - b.position();
        self.tangent = self.normal.left();

        self.normal_mass = effective_mass(a, b, self.r_a, self.r_b, self.normal);
        self.tangent_mass = effective_mass(a, b, self.r_a, self.r_b, self.tangent);

        self.bias = params.resolve_rate * (self.penetration - params.resolve_slop).max(FixedNum::ZERO);
        self.bias_impulse = FixedNum::ZERO;

        let approach = relative_velocity(a, b, self.r_a, self.r_b).dot(self.normal);
        self.restitution_bias = if approach < -RESTITUTION_THRESHOLD {
            -restitution * approach
        } else {
            FixedNum::ZERO
        };

        let impulse = self.normal * self.normal_impulse + self.tangent * self.tangent_impulse;
        a.apply_impulse(-impulse, self.r_a);
        b.apply_impulse(impulse, self.r_b);
    }

    /// One iteration over this contact.
    pub fn solve(&mut self, a: &mut Body, b: &mut Body, friction: FixedNum) {
        // Bias channel, its own accumulator kept non-negative
        let bias_speed = relative_bias_velocity(a, b, self.r_a, self.r_b).dot(self.normal);
        let delta = self.normal_mass * (self.bias - bias_speed);
        let previous = self.bias_impulse;
        self.bias_impulse = (previous + delta).max(FixedNum::ZERO);
        let applied = self.normal * (self.bias_impulse - previous);
        a.apply_bias(-applied, self.r_a);
        b.apply_bias(applied, self.r_b);

        // Normal
        let normal_speed = relative_velocity(a, b, self.r_a, self.r_b).dot(self.normal);
        let delta = self.normal_mass * (self.restitution_bias - normal_speed);
        let previous = self.normal_impulse;
        self.normal_impulse = (previous + delta).max(FixedNum::ZERO);
        let applied = self.normal * (self.normal_impulse - previous);
        a.apply_impulse(-applied, self.r_a);
        b.apply_impulse(applied, self.r_b);

        // Friction
        let tangent_speed = relative_velocity(a, b, self.r_a, self.r_b).dot(self.tangent);
        let delta = -self.tangent_mass * tangent_speed;
        let limit = friction * self.normal_impulse;
        let previous = self.tangent_impulse;
        self.tangent_impulse = (previous + delta).clamp(-limit, limit);
        let applied = self.tangent * (self.tangent_impulse - previous);
        a.apply_impulse(-applied, self.r_a);
        b.apply_impulse(applied, self.r_b);
    }
}

/// Pre-step every contact of `manifold`. Pairs whose bodies are gone are skipped.
pub fn pre_step(manifold: &Manifold, contacts: &mut Pool<Contact>, bodies: &mut Pool<Body>, params: &SolverParams) {
    let Some((a, b)) = bodies.get_pair_mut(manifold.body_a(), manifold.body_b()) else {
        return;
    };
    for &index in &manifold.contacts {
        if let Some(contact) = contacts.get_index_mut(index) {
            contact.pre_step(a, b, manifold.restitution, params);
        }
    }
}

/// One solver iteration over every contact of `manifold`.
pub fn solve(manifold: &Manifold, contacts: &mut Pool<Contact>, bodies: &mut Pool<Body>) {
    let Some((a, b)) = bodies.get_pair_mut(manifold.body_a(), manifold.body_b()) else {
        return;
    };
    for &index in &manifold.contacts {
        if let Some(contact) = contacts.get_index_mut(index) {
            contact.solve(a, b, manifold.friction);
        }
    }
}
