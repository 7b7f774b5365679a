use crate::entry::CacheEntry;
use crate::metrics::MetricsSnapshot;
use crate::shared::CacheShared;
use crate::task::janitor;
use crate::time;

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Pass as the `ttl` of [`TtlCache::set`] to store an entry that never expires.
pub const NO_EXPIRATION: Duration = Duration::ZERO;

/// A thread-safe, sharded key/value cache with per-entry time-to-live.
///
/// Cloning is cheap and yields another handle to the same cache. Values are
/// stored in an `Arc<V>`, so `V` does not need to be `Clone`.
///
/// Expired entries are never returned, even before the background sweep has
/// removed them.
pub struct TtlCache<K, V, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K, V, H> fmt::Debug for TtlCache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TtlCache").field("shared", &self.shared).finish()
  }
}

impl<K, V, H> Clone for TtlCache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<K, V, H> TtlCache<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Retrieves a value, returning a shared handle to it.
  ///
  /// Returns `None` if the key was never set, was deleted, or has expired.
  pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.lookup(key, CacheEntry::value)
  }

  /// Looks up an entry and, if found, applies a closure to the value.
  ///
  /// The closure runs while a read lock is held on the entry's shard, so it
  /// should be fast.
  pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    self.lookup(key, |entry| f(entry.value_ref()))
  }

  fn lookup<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&CacheEntry<V>) -> R,
  {
    let metrics = &self.shared.metrics;
    let guard = self.shared.store.get_shard(key).read();

    match guard.get(key) {
      Some(entry) if entry.is_expired() => {
        metrics.expired_on_read.fetch_add(1, Ordering::Relaxed);
        metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
      }
      Some(entry) => {
        metrics.hits.fetch_add(1, Ordering::Relaxed);
        Some(f(entry))
      }
      None => {
        metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
      }
    }
  }

  /// Stores a value, overwriting any previous entry for the key.
  ///
  /// A zero `ttl` (see [`NO_EXPIRATION`]) stores the entry forever; any other
  /// value expires it `ttl` from now.
  pub fn set(&self, key: K, value: V, ttl: Duration) {
    let entry = CacheEntry::new(value, ttl);
    let previous = self.shared.store.get_shard(&key).write().insert(key, entry);

    let counter = match previous {
      Some(_) => &self.shared.metrics.updates,
      None => &self.shared.metrics.inserts,
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Removes the entry for `key`. Deleting an absent key is a no-op.
  ///
  /// Returns `true` if an entry was removed.
  pub fn delete<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let removed = self.shared.store.get_shard(key).write().remove(key).is_some();
    if removed {
      self.shared.metrics.deletes.fetch_add(1, Ordering::Relaxed);
    }
    removed
  }

  /// Returns `true` if an unexpired entry exists for `key`.
  /// Does not count as a hit or miss.
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self
      .shared
      .store
      .get_shard(key)
      .read()
      .get(key)
      .is_some_and(|entry| !entry.is_expired())
  }

  /// Returns the number of unexpired entries.
  ///
  /// Shards are counted one at a time, so the result is approximate while
  /// other threads are writing.
  pub fn len(&self) -> usize {
    let now = time::now_nanos();
    self
      .shared
      .store
      .iter_shards()
      .map(|shard| {
        shard
          .read()
          .values()
          .filter(|entry| !entry.is_expired_at(now))
          .count()
      })
      .sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Removes every entry from the cache.
  pub fn clear(&self) {
    for shard in self.shared.store.iter_shards() {
      shard.write().clear();
    }
  }

  /// Runs one sweep pass on the calling thread, returning the number of
  /// entries evicted.
  pub fn sweep_now(&self) -> usize {
    janitor::sweep(&self.shared.store, &self.shared.metrics)
  }
}

impl<K, V, H> TtlCache<K, V, H> {
  /// Stops the background sweep.
  ///
  /// Only the first call has any effect; later calls return immediately. The
  /// cache stays readable and writable afterwards, but expired entries are
  /// only hidden on read, no longer removed.
  pub fn close(&self) {
    if self.shared.stop_janitor() {
      tracing::debug!("ttl cache closed");
    }
  }

  /// Returns `true` once `close` has been called.
  pub fn is_closed(&self) -> bool {
    self.shared.closed.load(Ordering::Acquire)
  }

  /// Returns the interval between background sweeps.
  pub fn sweep_interval(&self) -> Duration {
    self.shared.sweep_interval
  }

  /// Returns the number of shards backing the cache.
  pub fn shard_count(&self) -> usize {
    self.shared.store.num_shards()
  }

  /// Returns `true` if both handles refer to the same cache.
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.shared, &other.shared)
  }
}

impl<K, V, H> TtlCache<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  pub fn metrics(&self) -> MetricsSnapshot {
    let stored = self
      .shared
      .store
      .iter_shards()
      .map(|shard| shard.read().len())
      .sum();
    self.shared.metrics.snapshot(stored)
  }
}
