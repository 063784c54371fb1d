//! Deterministic fixed-point 2D rigid body physics.
//!
//! Every quantity the simulation touches is an [`I48F16`](fixed::types::I48F16)
//! fixed-point number, so identical inputs produce bit-identical worlds on every
//! peer. Floats only appear when human-authored settings are converted into a
//! [`WorldConfig`](config::WorldConfig).
//!
//! The entry point is [`World`](world::World): create bodies from
//! [`BodyDef`](body::BodyDef)s, call [`World::update`](world::World::update) once per
//! fixed tick, and issue queries (optionally against past ticks) between updates.

pub mod body;
pub mod broadphase;
pub mod collections;
pub mod collision;
pub mod config;
pub mod error;
pub mod fixed_math;
pub mod profiling;
pub mod shape;
pub mod world;

pub use body::{Body, BodyDef, BodyHandle, BodyType};
pub use config::{PhysicsSettings, WorldConfig};
pub use error::{MatrixError, PhysicsError, PhysicsResult};
pub use fixed_math::{Aabb, FixedNum, FixedVec2, Matrix, Transform2D};
pub use shape::{Material, Shape, ShapeDef, ShapeKind};
pub use world::World;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Conditionally log messages based on tick interval when perf_stats feature is enabled.
///
/// This macro logs a message every 100 ticks. When the perf_stats feature is disabled,
/// this macro compiles to nothing - zero runtime cost.
///
/// # Example
/// ```ignore
/// profile_log!(self.tick, "Solved {} manifolds", self.active_manifolds.len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick % 100 == 0 {
            tracing::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
