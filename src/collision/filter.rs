//! Collision filters.
//!
//! A filter is a pure predicate over an ordered body pair. The canonical filters
//! below are composed from the building blocks at the bottom of this module; every
//! world, trigger and motion entry point accepts a replacement.

use crate::body::{Body, BodyType};

/// Predicate deciding whether `one` should interact with `other`.
pub type CollisionFilter = fn(&Body, &Body) -> bool;

/// Pairs the solver resolves every tick.
///
/// Drops identity pairs, pairs whose layers do not match in both directions, and
/// the category pairs that never need resolving: Static-Static,
/// Static-Kinematic and Kinematic-Kinematic.
pub fn world_filter(one: &Body, other: &Body) -> bool {
    if is_same_body(one, other) {
        return false;
    }
    if !layers_match(one, other) || !layers_match(other, one) {
        return false;
    }
    !matches!(
        (one.body_type(), other.body_type()),
        (BodyType::Static, BodyType::Static)
            | (BodyType::Static, BodyType::Kinematic)
            | (BodyType::Kinematic, BodyType::Static)
            | (BodyType::Kinematic, BodyType::Kinematic)
    )
}

/// Trigger overlap checks want every category, so only identity and mask apply.
pub fn trigger_query_filter(trigger: &Body, other: &Body) -> bool {
    !is_same_body(trigger, other) && layers_match(trigger, other)
}

/// Obstacles for kinematic sweeps: the static and kinematic population only.
pub fn move_filter(mover: &Body, obstacle: &Body) -> bool {
    !is_same_body(mover, obstacle)
        && layers_match(mover, obstacle)
        && !matches!(obstacle.body_type(), BodyType::Dynamic | BodyType::Trigger)
}

pub fn is_same_body(one: &Body, other: &Body) -> bool {
    one.handle() == other.handle()
}

/// `one` wants to hit what `other` is.
pub fn layers_match(one: &Body, other: &Body) -> bool {
    (one.mask & other.layer) != 0
}
