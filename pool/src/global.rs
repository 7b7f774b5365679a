//! The process-wide pool registry.

use crate::registry::PoolRegistry;
use once_cell::sync::Lazy;

// Created on first access.
static GLOBAL_REGISTRY: Lazy<PoolRegistry> = Lazy::new(PoolRegistry::default);

/// Provides a reference to the process-wide pool registry.
///
/// # Examples
///
/// ```
/// use trellis_pool::{global, PoolSize, WorkerPool};
///
/// let pool = WorkerPool::new(PoolSize::Bounded(2)).unwrap();
/// global().register("doc-example", pool).unwrap();
/// assert!(global().contains("doc-example"));
/// ```
pub fn global() -> &'static PoolRegistry {
  &GLOBAL_REGISTRY
}
