//! Dispatches closures onto named pools or ad hoc threads.

use crate::context::{CancelHandle, TaskContext};
use crate::error::{BoxError, ExecuteError, TaskFailure};
use crate::guard;
use crate::handle::{TaskHandle, TaskState};
use crate::sink::{ErrorSink, TracingSink};

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use trellis_pool::PoolRegistry;

const AD_HOC_THREAD_NAME: &str = "trellis-task";

#[derive(Clone)]
enum Registry {
  Global,
  Shared(Arc<PoolRegistry>),
}

impl Registry {
  fn get(&self) -> &PoolRegistry {
    match self {
      Registry::Global => trellis_pool::global(),
      Registry::Shared(registry) => registry.as_ref(),
    }
  }
}

/// Launches fire-and-forget tasks.
///
/// Every task runs behind a panic guard. Panics and returned errors go to the
/// executor's [`ErrorSink`] and never reach the caller. Dispatch itself never
/// blocks: it fails fast with [`ExecuteError`] if the chosen pool is full.
///
/// A pool name that is not registered is logged at warn level and the task
/// runs on an ad hoc thread instead.
#[derive(Clone)]
pub struct Executor {
  registry: Registry,
  sink: Arc<dyn ErrorSink>,
}

impl Default for Executor {
  fn default() -> Self {
    Self::new()
  }
}

impl Executor {
  /// An executor that resolves pools in the process-wide registry and logs
  /// failures through `tracing`.
  pub fn new() -> Self {
    Self {
      registry: Registry::Global,
      sink: Arc::new(TracingSink),
    }
  }

  /// Resolves pools in `registry` instead of the process-wide one.
  pub fn with_registry(mut self, registry: Arc<PoolRegistry>) -> Self {
    self.registry = Registry::Shared(registry);
    self
  }

  /// Replaces the error sink.
  pub fn with_sink<S: ErrorSink + 'static>(mut self, sink: S) -> Self {
    self.sink = Arc::new(sink);
    self
  }

  pub fn registry(&self) -> &PoolRegistry {
    self.registry.get()
  }

  /// Runs `f` on the pool named `pool`, or on an ad hoc thread.
  pub fn execute<F>(&self, pool: Option<&str>, f: F) -> Result<TaskHandle, ExecuteError>
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let task = handle.clone();
    let sink = Arc::clone(&self.sink);

    self.dispatch(pool, move || {
      task.set_state(TaskState::Running);
      let state = match guard::catch_panic(f) {
        Ok(()) => TaskState::Completed,
        Err(message) => {
          report(sink.as_ref(), None, TaskFailure::Panicked { message });
          TaskState::PanicRecovered
        }
      };
      task.set_state(state);
    })?;
    Ok(handle)
  }

  /// Runs `f` with a context forked from `ctx`: same values, and a
  /// cancellation signal that follows `ctx` but can be cancelled on its own.
  pub fn execute_with_context<F>(
    &self,
    ctx: &TaskContext,
    pool: Option<&str>,
    f: F,
  ) -> Result<TaskHandle, ExecuteError>
  where
    F: FnOnce(TaskContext) + Send + 'static,
  {
    let (child, cancel) = ctx.with_cancel();
    self.launch(child, cancel, pool, move |ctx| {
      f(ctx);
      Ok::<(), BoxError>(())
    })
  }

  /// Runs `f` with a context that expires `timeout` from now. A zero timeout
  /// sets no deadline.
  ///
  /// An error returned by `f` is forwarded to the sink along with the
  /// context. The context is cancelled once `f` returns.
  pub fn execute_with_timeout<F, E>(
    &self,
    ctx: &TaskContext,
    timeout: Duration,
    pool: Option<&str>,
    f: F,
  ) -> Result<TaskHandle, ExecuteError>
  where
    F: FnOnce(TaskContext) -> Result<(), E> + Send + 'static,
    E: Into<BoxError>,
  {
    let (child, cancel) = if timeout.is_zero() {
      ctx.with_cancel()
    } else {
      ctx.with_timeout(timeout)
    };
    self.launch(child, cancel, pool, f)
  }

  fn launch<F, E>(
    &self,
    ctx: TaskContext,
    cancel: CancelHandle,
    pool: Option<&str>,
    f: F,
  ) -> Result<TaskHandle, ExecuteError>
  where
    F: FnOnce(TaskContext) -> Result<(), E> + Send + 'static,
    E: Into<BoxError>,
  {
    let handle = TaskHandle::new();
    let task = handle.clone();
    let sink = Arc::clone(&self.sink);

    self.dispatch(pool, move || {
      task.set_state(TaskState::Running);
      let outcome = guard::catch_panic(|| f(ctx.clone()));
      let cancelled = ctx.is_cancelled();

      let state = match outcome {
        Ok(Ok(())) if cancelled => TaskState::Cancelled,
        Ok(Ok(())) => TaskState::Completed,
        Ok(Err(err)) => {
          report(sink.as_ref(), Some(&ctx), TaskFailure::Returned(err.into()));
          if cancelled {
            TaskState::Cancelled
          } else {
            TaskState::Completed
          }
        }
        Err(message) => {
          report(sink.as_ref(), Some(&ctx), TaskFailure::Panicked { message });
          TaskState::PanicRecovered
        }
      };
      cancel.cancel();
      task.set_state(state);
    })?;
    Ok(handle)
  }

  fn dispatch<F>(&self, pool: Option<&str>, job: F) -> Result<(), ExecuteError>
  where
    F: FnOnce() + Send + 'static,
  {
    if let Some(name) = pool {
      match self.registry.get().get_pool(name) {
        Ok(pool) => return pool.submit(job).map_err(ExecuteError::Rejected),
        Err(err) => {
          tracing::warn!(pool = name, error = %err, "unknown pool, running task on an ad hoc thread");
        }
      }
    }

    thread::Builder::new()
      .name(AD_HOC_THREAD_NAME.to_string())
      .spawn(job)?;
    Ok(())
  }
}

// The sink is user code too; a panic in it must not leave the task unfinished.
fn report(sink: &dyn ErrorSink, ctx: Option<&TaskContext>, failure: TaskFailure) {
  if let Err(message) = guard::catch_panic(|| sink.report_error(ctx, &failure)) {
    tracing::error!(failure = %failure, "error sink panicked: {}", message);
  }
}

impl fmt::Debug for Executor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let registry = match self.registry {
      Registry::Global => "global",
      Registry::Shared(_) => "shared",
    };
    f.debug_struct("Executor")
      .field("registry", &registry)
      .finish_non_exhaustive()
  }
}
