//! Contact generation and resolution.
//!
//! - [`filter`]: which body pairs interact at all
//! - [`narrowphase`]: exact shape-pair contact points
//! - [`manifold`]: pooled per-pair contact sets with cached impulses
//! - [`solver`]: warm-started sequential impulses

pub mod filter;
pub mod manifold;
pub mod narrowphase;
pub mod solver;

#[cfg(test)]
mod tests;

pub use filter::{is_same_body, layers_match, move_filter, trigger_query_filter, world_filter, CollisionFilter};
pub use manifold::{Contact, Manifold, PairKey, ShapeRef, WarmStart};
pub use narrowphase::{collide, ContactList, ContactPoint, MAX_CONTACTS};
pub use solver::SolverParams;
