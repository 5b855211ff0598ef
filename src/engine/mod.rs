//! Invalidation and recomputation.
//!
//! Staleness is pushed eagerly: invalidating a task marks it and every task
//! downstream of it stale, which only flips flags and drops cached values.
//! Computation is pulled lazily: reading an output refreshes the stale
//! producers it depends on, depth first, and runs each of them once. A large
//! graph can therefore be invalidated cheaply while only the part that is
//! actually read gets recomputed.

mod cascade;
mod compute;
mod diagnostics;

pub use crate::engine::diagnostics::{Diagnostics, TaskExecution};
