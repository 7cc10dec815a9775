//! Disposal recommendations per material
//!
//! Each scope (the global live feed, or one session) cycles through a
//! material's ten recommendations in random order before any repeats.

mod pool;
mod rotator;
mod usage;

pub use pool::{pool, POOL_SIZE};
pub use rotator::{RecommendationRotator, UNRECOGNIZED_MATERIAL};
pub use usage::{Scope, UsageStore};
