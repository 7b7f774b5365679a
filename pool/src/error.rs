use std::io;
use thiserror::Error;

/// Errors from submitting work to, or releasing, a single [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Error)]
pub enum PoolError {
  #[error("pool size must be at least 1")]
  InvalidSize,

  #[error("pool '{0}' has been released")]
  Released(String),

  #[error("pool '{pool}' is overloaded: {waiting} tasks already waiting for a worker")]
  Overloaded { pool: String, waiting: usize },

  #[error("pool '{pool}' did not drain in time: {running} workers still running")]
  ReleaseTimeout { pool: String, running: usize },

  #[error("failed to spawn a worker thread for pool '{pool}': {source}")]
  Spawn {
    pool: String,
    #[source]
    source: io::Error,
  },
}

/// Errors from the pool registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("pool name must not be empty")]
  EmptyName,

  #[error("a pool named '{0}' is already registered")]
  Duplicate(String),

  #[error("pool '{0}' was released before registration")]
  Released(String),

  #[error("no pool named '{0}' is registered")]
  NotFound(String),

  #[error("pools did not drain before the release timeout: {}", .pools.join(", "))]
  ReleaseTimeout { pools: Vec<String> },
}

/// A specialized `Result` type for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
