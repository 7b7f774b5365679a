//! A worker pool backed by OS threads.
//!
//! Workers are spawned on demand up to the pool's capacity and exit as soon as
//! the queue runs dry, so an idle pool holds no threads. Submission never
//! blocks: a job either starts a worker, waits in the queue, or is rejected.

use crate::error::PoolError;

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

type Job = Box<dyn FnOnce() + Send + 'static>;

const DEFAULT_POOL_NAME: &str = "trellis-pool";

/// How many workers a pool may run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSize {
  Bounded(usize),
  Unbounded,
}

struct PoolState {
  queue: VecDeque<Job>,
  running: usize,
  released: bool,
}

struct PoolInner {
  name: String,
  capacity: PoolSize,
  max_blocking: Option<usize>,
  state: Mutex<PoolState>,
  idle: Condvar,
}

/// A handle to a pool of worker threads. Cloning yields another handle to the
/// same pool.
#[derive(Clone)]
pub struct WorkerPool {
  inner: Arc<PoolInner>,
}

/// Configures and builds a [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct PoolBuilder {
  name: String,
  size: PoolSize,
  max_blocking: Option<usize>,
}

impl Default for PoolBuilder {
  fn default() -> Self {
    Self {
      name: DEFAULT_POOL_NAME.to_string(),
      size: PoolSize::Unbounded,
      max_blocking: None,
    }
  }
}

impl PoolBuilder {
  /// Labels the pool's worker threads and errors.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn size(mut self, size: PoolSize) -> Self {
    self.size = size;
    self
  }

  /// Caps the number of jobs that may wait for a free worker. Without a cap
  /// the queue is unbounded.
  pub fn max_blocking(mut self, max: usize) -> Self {
    self.max_blocking = Some(max);
    self
  }

  pub fn build(self) -> Result<WorkerPool, PoolError> {
    if self.size == PoolSize::Bounded(0) {
      return Err(PoolError::InvalidSize);
    }
    tracing::debug!(
      pool = %self.name,
      size = ?self.size,
      max_blocking = ?self.max_blocking,
      "worker pool created"
    );
    Ok(WorkerPool {
      inner: Arc::new(PoolInner {
        name: self.name,
        capacity: self.size,
        max_blocking: self.max_blocking,
        state: Mutex::new(PoolState {
          queue: VecDeque::new(),
          running: 0,
          released: false,
        }),
        idle: Condvar::new(),
      }),
    })
  }
}

impl WorkerPool {
  /// Creates a pool of the given size with an unbounded queue.
  pub fn new(size: PoolSize) -> Result<Self, PoolError> {
    Self::builder().size(size).build()
  }

  pub fn builder() -> PoolBuilder {
    PoolBuilder::default()
  }

  /// Hands a job to the pool without blocking.
  ///
  /// Starts a new worker if the pool is below capacity, otherwise queues the
  /// job. Fails with [`PoolError::Overloaded`] when the queue is at its cap
  /// and with [`PoolError::Released`] once the pool has been released.
  pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
  where
    F: FnOnce() + Send + 'static,
  {
    let mut state = self.inner.state.lock();
    if state.released {
      return Err(PoolError::Released(self.inner.name.clone()));
    }

    let has_free_worker = match self.inner.capacity {
      PoolSize::Bounded(cap) => state.running < cap,
      PoolSize::Unbounded => true,
    };
    if has_free_worker {
      state.running += 1;
      drop(state);
      return self.spawn_worker(Box::new(job));
    }

    if let Some(max) = self.inner.max_blocking {
      if state.queue.len() >= max {
        return Err(PoolError::Overloaded {
          pool: self.inner.name.clone(),
          waiting: state.queue.len(),
        });
      }
    }
    state.queue.push_back(Box::new(job));
    Ok(())
  }

  fn spawn_worker(&self, first: Job) -> Result<(), PoolError> {
    let inner = Arc::clone(&self.inner);
    let spawned = thread::Builder::new()
      .name(format!("{}-worker", self.inner.name))
      .spawn(move || run_worker(inner, first));

    match spawned {
      Ok(_) => Ok(()),
      Err(source) => {
        self.inner.finish_worker(&mut self.inner.state.lock());
        Err(PoolError::Spawn {
          pool: self.inner.name.clone(),
          source,
        })
      }
    }
  }

  /// Stops accepting new jobs. Queued and running jobs still finish.
  ///
  /// Returns `true` only for the call that performed the release.
  pub fn release(&self) -> bool {
    let mut state = self.inner.state.lock();
    if state.released {
      return false;
    }
    state.released = true;
    tracing::debug!(pool = %self.inner.name, "worker pool released");
    true
  }

  /// Releases the pool and waits up to `timeout` for every queued and running
  /// job to finish.
  pub fn release_timeout(&self, timeout: Duration) -> Result<(), PoolError> {
    self.release();
    if self.wait_idle_until(Instant::now() + timeout) {
      Ok(())
    } else {
      Err(PoolError::ReleaseTimeout {
        pool: self.inner.name.clone(),
        running: self.running(),
      })
    }
  }

  /// Blocks until the pool has no running or queued jobs, or `deadline`
  /// passes. Returns `true` if the pool drained.
  pub(crate) fn wait_idle_until(&self, deadline: Instant) -> bool {
    let mut state = self.inner.state.lock();
    while state.running > 0 {
      if self.inner.idle.wait_until(&mut state, deadline).timed_out() {
        return state.running == 0;
      }
    }
    true
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  /// The maximum number of concurrent workers, or `None` if unbounded.
  pub fn capacity(&self) -> Option<usize> {
    match self.inner.capacity {
      PoolSize::Bounded(cap) => Some(cap),
      PoolSize::Unbounded => None,
    }
  }

  pub fn max_blocking(&self) -> Option<usize> {
    self.inner.max_blocking
  }

  /// Number of workers currently alive.
  pub fn running(&self) -> usize {
    self.inner.state.lock().running
  }

  /// Number of jobs waiting for a free worker.
  pub fn waiting(&self) -> usize {
    self.inner.state.lock().queue.len()
  }

  pub fn is_released(&self) -> bool {
    self.inner.state.lock().released
  }

  /// Returns `true` if both handles refer to the same pool.
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for WorkerPool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.state.lock();
    f.debug_struct("WorkerPool")
      .field("name", &self.inner.name)
      .field("capacity", &self.inner.capacity)
      .field("max_blocking", &self.inner.max_blocking)
      .field("running", &state.running)
      .field("waiting", &state.queue.len())
      .field("released", &state.released)
      .finish()
  }
}

impl PoolInner {
  fn finish_worker(&self, state: &mut PoolState) {
    state.running -= 1;
    if state.running == 0 {
      self.idle.notify_all();
    }
  }
}

fn run_worker(inner: Arc<PoolInner>, first: Job) {
  let mut job = first;
  loop {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
      tracing::error!(pool = %inner.name, "job panicked inside worker pool");
    }

    let mut state = inner.state.lock();
    match state.queue.pop_front() {
      Some(next) => job = next,
      None => {
        inner.finish_worker(&mut state);
        return;
      }
    }
  }
}
