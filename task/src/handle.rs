use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Where a dispatched task is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  /// Accepted by a pool or thread but not started.
  Submitted,
  Running,
  /// Returned normally. A returned error still ends here, after it has been
  /// reported.
  Completed,
  /// Panicked; the panic was caught and reported.
  PanicRecovered,
  /// Returned after its context had been cancelled or had expired.
  Cancelled,
}

impl TaskState {
  pub fn is_terminal(self) -> bool {
    !matches!(self, TaskState::Submitted | TaskState::Running)
  }
}

struct HandleInner {
  state: Mutex<TaskState>,
  finished: Condvar,
}

/// Observes one dispatched task. Dropping the handle does not affect the task.
#[derive(Clone)]
pub struct TaskHandle {
  inner: Arc<HandleInner>,
}

impl TaskHandle {
  pub(crate) fn new() -> Self {
    Self {
      inner: Arc::new(HandleInner {
        state: Mutex::new(TaskState::Submitted),
        finished: Condvar::new(),
      }),
    }
  }

  pub(crate) fn set_state(&self, state: TaskState) {
    *self.inner.state.lock() = state;
    if state.is_terminal() {
      self.inner.finished.notify_all();
    }
  }

  pub fn state(&self) -> TaskState {
    *self.inner.state.lock()
  }

  pub fn is_finished(&self) -> bool {
    self.state().is_terminal()
  }

  /// Blocks until the task reaches a terminal state.
  pub fn wait(&self) -> TaskState {
    let mut state = self.inner.state.lock();
    while !state.is_terminal() {
      self.inner.finished.wait(&mut state);
    }
    *state
  }

  /// Blocks for at most `timeout`. Returns the terminal state, or `None` if
  /// the task is still going.
  pub fn wait_timeout(&self, timeout: Duration) -> Option<TaskState> {
    let deadline = Instant::now() + timeout;
    let mut state = self.inner.state.lock();
    while !state.is_terminal() {
      if self.inner.finished.wait_until(&mut state, deadline).timed_out() {
        break;
      }
    }
    state.is_terminal().then_some(*state)
  }
}

impl fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskHandle").field("state", &self.state()).finish()
  }
}
