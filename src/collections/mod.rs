//! Generic collections used by the simulation core.
//!
//! # Example: Quick Start
//!
//! ```rust
//! use kestrel::collections::Pool;
//!
//! let mut pool = Pool::<u32>::new();
//! let key = pool.acquire();
//! *pool.get_mut(key).unwrap() = 7;
//! assert_eq!(pool.remove(key), Some(7));
//! assert!(pool.get(key).is_none());
//! ```

pub mod pool;

#[cfg(test)]
mod tests;

pub use pool::{Pool, PoolKey};
