//! The process-wide executor and free-function shortcuts to it.

use crate::context::TaskContext;
use crate::error::{BoxError, ExecuteError};
use crate::executor::Executor;
use crate::handle::TaskHandle;

use std::time::Duration;

use once_cell::sync::OnceCell;

static GLOBAL_EXECUTOR: OnceCell<Executor> = OnceCell::new();

/// Installs `executor` as the process-wide executor.
///
/// Must run before the first call to [`global`] or any of the free functions.
/// Returns the executor back if one is already installed.
pub fn init_global(executor: Executor) -> Result<(), Executor> {
  GLOBAL_EXECUTOR.set(executor)
}

/// Provides a reference to the process-wide executor, creating the default
/// one (global pool registry, `tracing` sink) on first use.
pub fn global() -> &'static Executor {
  GLOBAL_EXECUTOR.get_or_init(Executor::new)
}

/// Shortcut for [`Executor::execute`] on the process-wide executor.
///
/// # Examples
///
/// ```
/// let handle = trellis_task::execute(None, || {
///   // background work
/// })
/// .unwrap();
/// assert_eq!(handle.wait(), trellis_task::TaskState::Completed);
/// ```
pub fn execute<F>(pool: Option<&str>, f: F) -> Result<TaskHandle, ExecuteError>
where
  F: FnOnce() + Send + 'static,
{
  global().execute(pool, f)
}

/// Shortcut for [`Executor::execute_with_context`] on the process-wide executor.
pub fn execute_with_context<F>(
  ctx: &TaskContext,
  pool: Option<&str>,
  f: F,
) -> Result<TaskHandle, ExecuteError>
where
  F: FnOnce(TaskContext) + Send + 'static,
{
  global().execute_with_context(ctx, pool, f)
}

/// Shortcut for [`Executor::execute_with_timeout`] on the process-wide executor.
pub fn execute_with_timeout<F, E>(
  ctx: &TaskContext,
  timeout: Duration,
  pool: Option<&str>,
  f: F,
) -> Result<TaskHandle, ExecuteError>
where
  F: FnOnce(TaskContext) -> Result<(), E> + Send + 'static,
  E: Into<BoxError>,
{
  global().execute_with_timeout(ctx, timeout, pool, f)
}
