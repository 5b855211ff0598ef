#![forbid(unsafe_code)]
//! An incremental dataflow engine.
//!
//! A [`Pipeline`] owns a graph of tasks. Each task declares typed input and
//! output ports through its [`TaskKind`], and inputs are bound to the outputs
//! of other tasks with [`Pipeline::set_input`]. Changes propagate in two
//! directions:
//!
//! * **Push**: binding an input, editing a task or calling
//!   [`Pipeline::invalidate`] marks the task and everything downstream of it
//!   stale, dropping cached outputs. Nothing runs.
//! * **Pull**: reading an output with [`Pipeline::get_output_data`] first
//!   refreshes stale upstream tasks, then runs the task itself if needed and
//!   caches the result. Fresh tasks are never run twice.
//!
//! ```
//! use nagare::Pipeline;
//! use nagare::operators::{Add, Binary, Source};
//!
//! let mut pipeline = Pipeline::new();
//! let a = pipeline.add_task(Source::new(2i64));
//! let b = pipeline.add_task(Source::new(3i64));
//! let sum = pipeline.add_task(Binary::<i64, Add>::new());
//!
//! let port = pipeline.get_output(a, None)?;
//! pipeline.set_input(sum, Some("0"), port)?;
//! let port = pipeline.get_output(b, None)?;
//! pipeline.set_input(sum, Some("1"), port)?;
//!
//! assert_eq!(*pipeline.get_output_value::<i64>(sum, None)?, 5);
//!
//! pipeline.set_source(a, 10i64)?;
//! assert!(pipeline.is_dirty(sum)?);
//! assert_eq!(*pipeline.get_output_value::<i64>(sum, None)?, 13);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod core;
mod engine;
mod error;
pub mod operators;
mod pipeline;
mod port;
mod task;
#[cfg(test)]
mod testing;
mod utils;

pub use crate::core::{Compatibility, Config, DataType, Dynamic, Exact, TypeRegistry};
pub use crate::engine::{Diagnostics, TaskExecution};
pub use crate::error::*;
pub use crate::pipeline::Pipeline;
pub use crate::port::{
    DEFAULT_PORT, Direction, InputRef, OutputRef, PortDescriptor, Ports, make_input_port,
    make_output_port,
};
pub use crate::task::{FnKind, RunContext, TaskId, TaskKind};
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;
