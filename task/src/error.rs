use std::io;

use thiserror::Error;
use trellis_pool::PoolError;

/// A boxed error returned by a task.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a task could not be dispatched. Returned synchronously to the caller.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error("task rejected by pool: {0}")]
  Rejected(#[from] PoolError),

  #[error("failed to spawn a thread for the task: {0}")]
  Spawn(#[from] io::Error),
}

/// A failure inside a dispatched task, as handed to the error sink.
#[derive(Debug, Error)]
pub enum TaskFailure {
  #[error("background task panicked: {message}")]
  Panicked { message: String },

  #[error("background task returned an error: {0}")]
  Returned(#[source] BoxError),
}

impl TaskFailure {
  /// Tags to attach when forwarding the failure to an error tracker.
  pub fn tags(&self) -> &'static [(&'static str, &'static str)] {
    match self {
      TaskFailure::Panicked { .. } => &[("origin", "background")],
      TaskFailure::Returned(_) => &[],
    }
  }

  pub fn is_panic(&self) -> bool {
    matches!(self, TaskFailure::Panicked { .. })
  }
}
