//! Safe fire-and-forget task execution.
//!
//! An [`Executor`] runs closures on a named worker pool from a
//! [`PoolRegistry`](trellis_pool::PoolRegistry), or on an ad hoc thread when
//! no pool is named or the name is unknown. Each task:
//!
//! - runs behind a panic guard, so a panic never escapes its thread;
//! - can receive a [`TaskContext`] carrying request values and a cancellation
//!   signal, optionally with a deadline;
//! - reports panics and returned errors to an [`ErrorSink`].
//!
//! Cancellation is cooperative. A task observes it through
//! [`TaskContext::is_cancelled`] or [`TaskContext::wait_cancelled`].

pub mod context;
pub mod error;
pub mod executor;
pub mod global;
pub mod handle;
pub mod sink;

mod guard;

pub use context::{CancelHandle, CancelReason, RequestId, TaskContext};
pub use error::{BoxError, ExecuteError, TaskFailure};
pub use executor::Executor;
pub use global::{execute, execute_with_context, execute_with_timeout, global, init_global};
pub use handle::{TaskHandle, TaskState};
pub use sink::{ErrorSink, TracingSink};
