//! Task module - units of requested work and their ordering.
//!
//! Tasks come from the source scanner or from a queue file; they are
//! immutable once created and consumed once per loop pass.

pub mod task;
mod priority;

pub use priority::prioritize;
pub use task::{Severity, Task, TaskKind};
