use crate::metrics::Metrics;
use crate::store::ShardedStore;
use crate::task::janitor::Janitor;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<K, V, H> {
  pub(crate) store: Arc<ShardedStore<K, V, H>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) janitor: Mutex<Option<Janitor>>,
  pub(crate) sweep_interval: Duration,
  pub(crate) closed: AtomicBool,
}

impl<K, V, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("store", &self.store)
      .field("sweep_interval", &self.sweep_interval)
      .field("closed", &self.closed.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<K, V, H> CacheShared<K, V, H> {
  /// Stops the janitor. Only the first call does anything.
  pub(crate) fn stop_janitor(&self) -> bool {
    if self
      .closed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return false;
    }
    if let Some(janitor) = self.janitor.lock().take() {
      janitor.stop();
    }
    true
  }
}

impl<K, V, H> Drop for CacheShared<K, V, H> {
  fn drop(&mut self) {
    self.stop_janitor();
  }
}
