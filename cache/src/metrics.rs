use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the cache.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Throughput ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) deletes: CachePadded<AtomicU64>,

  // --- Expiry ---
  pub(crate) evicted_by_sweep: CachePadded<AtomicU64>,
  pub(crate) expired_on_read: CachePadded<AtomicU64>,
  pub(crate) sweeps: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      updates: CachePadded::new(AtomicU64::new(0)),
      deletes: CachePadded::new(AtomicU64::new(0)),
      evicted_by_sweep: CachePadded::new(AtomicU64::new(0)),
      expired_on_read: CachePadded::new(AtomicU64::new(0)),
      sweeps: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Creates a point-in-time snapshot of the current metrics.
  /// `len` is supplied by the caller since the collector does not track it.
  pub(crate) fn snapshot(&self, len: usize) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      deletes: self.deletes.load(Ordering::Relaxed),
      evicted_by_sweep: self.evicted_by_sweep.load(Ordering::Relaxed),
      expired_on_read: self.expired_on_read.load(Ordering::Relaxed),
      sweeps: self.sweeps.load(Ordering::Relaxed),
      len,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// The number of successful lookups.
  pub hits: u64,
  /// The number of lookups that found nothing, or found an expired entry.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// The number of `set` calls that created a new key.
  pub inserts: u64,
  /// The number of `set` calls that overwrote an existing key.
  pub updates: u64,
  /// The number of `delete` calls that removed an entry.
  pub deletes: u64,
  /// The number of entries removed by the background sweep.
  pub evicted_by_sweep: u64,
  /// The number of reads that found an entry past its expiry.
  pub expired_on_read: u64,
  /// The number of completed sweep passes.
  pub sweeps: u64,
  /// The number of entries stored at snapshot time, expired ones included.
  pub len: usize,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("deletes", &self.deletes)
      .field("evicted_by_sweep", &self.evicted_by_sweep)
      .field("expired_on_read", &self.expired_on_read)
      .field("sweeps", &self.sweeps)
      .field("len", &self.len)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
