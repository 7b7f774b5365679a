//! A directory of named worker pools.

use crate::error::{RegistryError, Result};
use crate::pool::WorkerPool;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Maps pool names to worker pools.
///
/// Lookups take a shared lock; registration and teardown take the exclusive
/// lock. Names are kept sorted.
#[derive(Default)]
pub struct PoolRegistry {
  pools: RwLock<BTreeMap<String, WorkerPool>>,
}

impl PoolRegistry {
  /// Creates a new, empty `PoolRegistry`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `pool` under `name`.
  ///
  /// Fails if the name is empty, already taken, or the pool has been
  /// released. An existing registration is never replaced.
  pub fn register(&self, name: impl Into<String>, pool: WorkerPool) -> Result<()> {
    let name = name.into();
    if name.is_empty() {
      return Err(RegistryError::EmptyName);
    }
    if pool.is_released() {
      return Err(RegistryError::Released(name));
    }

    match self.pools.write().entry(name) {
      Entry::Occupied(entry) => Err(RegistryError::Duplicate(entry.key().clone())),
      Entry::Vacant(entry) => {
        tracing::info!(pool = %entry.key(), capacity = ?pool.capacity(), "pool registered");
        entry.insert(pool);
        Ok(())
      }
    }
  }

  /// Looks up the pool registered under `name`.
  pub fn get_pool(&self, name: &str) -> Result<WorkerPool> {
    self
      .pools
      .read()
      .get(name)
      .cloned()
      .ok_or_else(|| RegistryError::NotFound(name.to_string()))
  }

  /// Returns the registered pool names in ascending order.
  pub fn pools(&self) -> Vec<String> {
    self.pools.read().keys().cloned().collect()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.pools.read().contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.pools.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.pools.read().is_empty()
  }

  /// Removes one pool, releases it, and waits up to `timeout` for it to drain.
  pub fn unregister(&self, name: &str, timeout: Duration) -> Result<()> {
    let pool = self
      .pools
      .write()
      .remove(name)
      .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

    pool.release();
    if pool.wait_idle_until(Instant::now() + timeout) {
      Ok(())
    } else {
      Err(RegistryError::ReleaseTimeout {
        pools: vec![name.to_string()],
      })
    }
  }

  /// Removes and releases every pool, then waits for all of them to drain
  /// against a single deadline `timeout` from now.
  ///
  /// On expiry the error lists the pools that were still busy. Their jobs keep
  /// running but the registry no longer tracks them.
  pub fn unregister_all(&self, timeout: Duration) -> Result<()> {
    let pools = std::mem::take(&mut *self.pools.write());
    for pool in pools.values() {
      pool.release();
    }

    let deadline = Instant::now() + timeout;
    let stuck: Vec<String> = pools
      .into_iter()
      .filter(|(_, pool)| !pool.wait_idle_until(deadline))
      .map(|(name, _)| name)
      .collect();

    if stuck.is_empty() {
      tracing::info!("all pools released");
      Ok(())
    } else {
      tracing::warn!(pools = ?stuck, "pools did not drain before the release timeout");
      Err(RegistryError::ReleaseTimeout { pools: stuck })
    }
  }
}

impl std::fmt::Debug for PoolRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PoolRegistry")
      .field("pools", &self.pools())
      .finish()
  }
}
