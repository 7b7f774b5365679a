use crate::metrics::Metrics;
use crate::store::ShardedStore;
use crate::time;

use std::hash::{BuildHasher, Hash};
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A context object holding the thread-safe parts of the cache that the
/// janitor needs to access.
pub(crate) struct JanitorContext<K, V, H> {
  pub(crate) store: Arc<ShardedStore<K, V, H>>,
  pub(crate) metrics: Arc<Metrics>,
}

/// Stop signal shared between the janitor thread and its owner.
#[derive(Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  condvar: Condvar,
}

/// The background task responsible for periodically sweeping expired entries.
pub(crate) struct Janitor {
  handle: JoinHandle<()>,
  signal: Arc<StopSignal>,
}

impl Janitor {
  /// Spawns a new janitor thread that sweeps once every `tick_interval`.
  pub(crate) fn spawn<K, V, H>(
    context: JanitorContext<K, V, H>,
    tick_interval: Duration,
  ) -> io::Result<Self>
  where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
  {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();

    let handle = thread::Builder::new()
      .name("trellis-cache-janitor".into())
      .spawn(move || {
        tracing::debug!(interval = ?tick_interval, "cache janitor started");
        loop {
          let deadline = Instant::now() + tick_interval;
          {
            let mut stopped = thread_signal.stopped.lock();
            while !*stopped {
              if thread_signal.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
              }
            }
            if *stopped {
              break;
            }
          }
          let removed = sweep(&context.store, &context.metrics);
          if removed > 0 {
            tracing::trace!(removed, "cache sweep evicted expired entries");
          }
        }
        tracing::debug!("cache janitor stopped");
      })?;

    Ok(Self { handle, signal })
  }

  /// Signals the janitor thread to stop and waits for it to exit.
  pub(crate) fn stop(self) {
    {
      let mut stopped = self.signal.stopped.lock();
      *stopped = true;
    }
    self.signal.condvar.notify_all();
    if self.handle.join().is_err() {
      tracing::error!("cache janitor thread panicked");
    }
  }
}

/// Removes every entry whose expiry has passed, one shard at a time.
///
/// `now` is sampled once per pass, so entries that expire mid-pass are left
/// for the next one. Returns the number of entries removed.
pub(crate) fn sweep<K, V, H>(store: &ShardedStore<K, V, H>, metrics: &Metrics) -> usize
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  let now = time::now_nanos();
  let mut removed = 0;

  for shard in store.iter_shards() {
    let mut guard = shard.write();
    let before = guard.len();
    guard.retain(|_, entry| !entry.is_expired_at(now));
    removed += before - guard.len();
  }

  metrics
    .evicted_by_sweep
    .fetch_add(removed as u64, Ordering::Relaxed);
  metrics.sweeps.fetch_add(1, Ordering::Relaxed);
  removed
}
