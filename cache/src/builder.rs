use crate::error::BuildError;
use crate::handle::TtlCache;
use crate::metrics::Metrics;
use crate::shared::CacheShared;
use crate::store::ShardedStore;
use crate::task::janitor::{Janitor, JanitorContext};

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// The sweep interval used when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A builder for creating `TtlCache` instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  pub(crate) shards: usize,
  pub(crate) sweep_interval: Duration,
  pub(crate) hasher: H,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("shards", &self.shards)
      .field("sweep_interval", &self.sweep_interval)
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the number of concurrent shards to use.
  ///
  /// Rounded up to a power of two. `0` is kept as-is so `build` can reject it.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = if shards == 0 { 0 } else { shards.next_power_of_two() };
    self
  }

  /// Sets the hasher for the cache.
  pub fn hasher<H2>(self, hasher: H2) -> CacheBuilder<K, V, H2> {
    CacheBuilder {
      shards: self.shards,
      sweep_interval: self.sweep_interval,
      hasher,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }

  /// Sets how often the background sweep scans for expired entries.
  ///
  /// Defaults to 60 seconds.
  pub fn sweep_interval(mut self, interval: Duration) -> Self {
    self.sweep_interval = interval;
    self
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      shards: (num_cpus::get() * 4).max(1).next_power_of_two(),
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
      hasher: H::default(),
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }
}

impl<K, V> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Builds the cache and starts its janitor thread.
  pub fn build(self) -> Result<TtlCache<K, V, H>, BuildError> {
    self.validate()?;

    let store = Arc::new(ShardedStore::new(self.shards, self.hasher.clone()));
    let metrics = Arc::new(Metrics::new());

    let janitor_context = JanitorContext {
      store: Arc::clone(&store),
      metrics: Arc::clone(&metrics),
    };
    let janitor = Janitor::spawn(janitor_context, self.sweep_interval)
      .map_err(|e| BuildError::JanitorSpawn(e.to_string()))?;

    tracing::debug!(
      shards = self.shards,
      sweep_interval = ?self.sweep_interval,
      "ttl cache built"
    );

    Ok(TtlCache {
      shared: Arc::new(CacheShared {
        store,
        metrics,
        janitor: Mutex::new(Some(janitor)),
        sweep_interval: self.sweep_interval,
        closed: AtomicBool::new(false),
      }),
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    if self.sweep_interval.is_zero() {
      return Err(BuildError::ZeroSweepInterval);
    }
    Ok(())
  }
}
