//! Data-parallel loops over integer index ranges.
//!
//! [`ParallelForExecutor::parallel_for`] splits `[start, end)` into one contiguous
//! chunk per hardware thread. All chunks but the last run on freshly spawned
//! workers, each owning its own copy of the task; the last chunk runs on the caller,
//! which then blocks until every worker has finished.

mod executor;
mod permits;
mod task;

pub use executor::{ParallelError, ParallelForExecutor};
pub use task::{FnTask, ParallelTask};
