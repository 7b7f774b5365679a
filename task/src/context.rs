//! Request-scoped values and cooperative cancellation.
//!
//! A [`TaskContext`] is immutable. Deriving a context (adding a value, a
//! cancel handle or a deadline) returns a new one that shares everything else
//! with its parent. Cancelling a parent cancels every context derived from it;
//! cancelling a child never affects the parent.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

type ValueMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Why a context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
  /// A [`CancelHandle`] on this context or an ancestor was triggered.
  Cancelled,
  /// The context's deadline passed.
  DeadlineExceeded,
}

impl fmt::Display for CancelReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CancelReason::Cancelled => write!(f, "context cancelled"),
      CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
    }
  }
}

/// A request identifier carried as a context value and attached to error
/// reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for RequestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

struct CancelSignal {
  reason: Mutex<Option<CancelReason>>,
  condvar: Condvar,
  // Already folded with every ancestor's deadline.
  deadline: Option<Instant>,
  parent: Option<Arc<CancelSignal>>,
  children: Mutex<Vec<Weak<CancelSignal>>>,
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
  match (a, b) {
    (Some(a), Some(b)) => Some(a.min(b)),
    (a, b) => a.or(b),
  }
}

impl CancelSignal {
  fn new(parent: Option<Arc<CancelSignal>>, deadline: Option<Instant>) -> Arc<Self> {
    let deadline = earliest(parent.as_ref().and_then(|p| p.deadline), deadline);
    let signal = Arc::new(Self {
      reason: Mutex::new(None),
      condvar: Condvar::new(),
      deadline,
      parent,
      children: Mutex::new(Vec::new()),
    });

    if let Some(parent) = &signal.parent {
      {
        let mut children = parent.children.lock();
        children.retain(|child| child.strong_count() > 0);
        children.push(Arc::downgrade(&signal));
      }
      // The parent may have been cancelled before we registered.
      if let Some(reason) = parent.reason() {
        signal.cancel(reason);
      }
    }
    signal
  }

  fn cancel(&self, reason: CancelReason) -> bool {
    {
      let mut current = self.reason.lock();
      if current.is_some() {
        return false;
      }
      *current = Some(reason);
    }
    self.condvar.notify_all();

    let children = std::mem::take(&mut *self.children.lock());
    for child in children.iter().filter_map(Weak::upgrade) {
      child.cancel(reason);
    }
    true
  }

  fn reason(&self) -> Option<CancelReason> {
    if let Some(reason) = *self.reason.lock() {
      return Some(reason);
    }
    if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
      return Some(CancelReason::DeadlineExceeded);
    }
    self.parent.as_ref().and_then(|parent| parent.reason())
  }

  // Blocks until cancelled, the deadline passes, or `limit` passes.
  fn wait(&self, limit: Option<Instant>) -> Option<CancelReason> {
    let wake_at = earliest(self.deadline, limit);
    let mut current = self.reason.lock();
    loop {
      if let Some(reason) = *current {
        return Some(reason);
      }
      match wake_at {
        None => self.condvar.wait(&mut current),
        Some(at) if Instant::now() >= at => {
          drop(current);
          return self.reason();
        }
        Some(at) => {
          self.condvar.wait_until(&mut current, at);
        }
      }
    }
  }
}

impl Drop for CancelSignal {
  // Prunes this signal's link, and any other dead ones, from the parent.
  fn drop(&mut self) {
    if let Some(parent) = &self.parent {
      parent.children.lock().retain(|child| child.strong_count() > 0);
    }
  }
}

/// Cancels the context it was created with, and every context derived from
/// that one. Dropping the handle does not cancel.
#[derive(Clone)]
pub struct CancelHandle {
  signal: Arc<CancelSignal>,
}

impl CancelHandle {
  /// Returns `true` if this call did the cancelling.
  pub fn cancel(&self) -> bool {
    self.signal.cancel(CancelReason::Cancelled)
  }
}

impl fmt::Debug for CancelHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CancelHandle")
      .field("reason", &self.signal.reason())
      .finish()
  }
}

/// Values and a cancellation signal that travel with a unit of work.
#[derive(Clone, Default)]
pub struct TaskContext {
  values: Arc<ValueMap>,
  signal: Option<Arc<CancelSignal>>,
}

impl TaskContext {
  /// An empty context that is never cancelled and has no deadline.
  pub fn background() -> Self {
    Self::default()
  }

  /// Returns a copy of this context that also carries `value`, replacing any
  /// earlier value of the same type.
  pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
    let mut values = ValueMap::clone(&self.values);
    values.insert(TypeId::of::<T>(), Arc::new(value));
    Self {
      values: Arc::new(values),
      signal: self.signal.clone(),
    }
  }

  pub fn value<T: Any>(&self) -> Option<&T> {
    self
      .values
      .get(&TypeId::of::<T>())
      .and_then(|value| (**value).downcast_ref::<T>())
  }

  fn derive(&self, deadline: Option<Instant>) -> (Self, CancelHandle) {
    let signal = CancelSignal::new(self.signal.clone(), deadline);
    let child = Self {
      values: Arc::clone(&self.values),
      signal: Some(Arc::clone(&signal)),
    };
    (child, CancelHandle { signal })
  }

  /// Derives a context that can be cancelled independently of this one.
  pub fn with_cancel(&self) -> (Self, CancelHandle) {
    self.derive(None)
  }

  /// Derives a context that expires at `deadline`, or earlier if this one
  /// does.
  pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
    self.derive(Some(deadline))
  }

  pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
    self.with_deadline(Instant::now() + timeout)
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.signal.as_ref().and_then(|signal| signal.deadline)
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel_reason().is_some()
  }

  pub fn cancel_reason(&self) -> Option<CancelReason> {
    self.signal.as_ref().and_then(|signal| signal.reason())
  }

  /// Blocks until the context is cancelled or its deadline passes.
  ///
  /// Returns `None` straight away for a context that can never be cancelled,
  /// such as [`TaskContext::background`].
  pub fn wait_cancelled(&self) -> Option<CancelReason> {
    self.signal.as_ref().and_then(|signal| signal.wait(None))
  }

  /// Like [`wait_cancelled`](Self::wait_cancelled) but gives up after
  /// `timeout`. Returns `true` if the context was cancelled.
  pub fn wait_cancelled_timeout(&self, timeout: Duration) -> bool {
    match &self.signal {
      Some(signal) => signal.wait(Some(Instant::now() + timeout)).is_some(),
      None => false,
    }
  }
}

impl fmt::Debug for TaskContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskContext")
      .field("values", &self.values.len())
      .field("deadline", &self.deadline())
      .field("cancelled", &self.cancel_reason())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::thread;

  #[test]
  fn values_are_copied_on_write() {
    let base = TaskContext::background().with_value(RequestId::new("req-1"));
    let child = base.with_value(42u32);

    assert_eq!(base.value::<RequestId>().map(RequestId::as_str), Some("req-1"));
    assert_eq!(base.value::<u32>(), None);
    assert_eq!(child.value::<u32>(), Some(&42));
    assert_eq!(child.value::<RequestId>(), base.value::<RequestId>());
  }

  #[test]
  fn cancelling_a_parent_reaches_grandchildren() {
    let (parent, cancel) = TaskContext::background().with_cancel();
    let (child, _) = parent.with_cancel();
    let (grandchild, _) = child.with_cancel();

    assert!(!grandchild.is_cancelled());
    assert!(cancel.cancel());
    assert!(!cancel.cancel());
    assert_eq!(grandchild.cancel_reason(), Some(CancelReason::Cancelled));
  }

  #[test]
  fn cancelling_a_child_leaves_the_parent_alone() {
    let (parent, _) = TaskContext::background().with_cancel();
    let (child, cancel_child) = parent.with_cancel();
    cancel_child.cancel();

    assert!(child.is_cancelled());
    assert!(!parent.is_cancelled());
  }

  #[test]
  fn child_of_a_cancelled_parent_starts_cancelled() {
    let (parent, cancel) = TaskContext::background().with_cancel();
    cancel.cancel();
    let (child, _) = parent.with_cancel();
    assert!(child.is_cancelled());
    assert_eq!(child.wait_cancelled(), Some(CancelReason::Cancelled));
  }

  #[test]
  fn child_deadline_never_outlives_the_parent() {
    let (parent, _) = TaskContext::background().with_timeout(Duration::from_millis(50));
    let (child, _) = parent.with_timeout(Duration::from_secs(60));
    assert_eq!(child.deadline(), parent.deadline());
  }

  #[test]
  fn wait_wakes_on_deadline() {
    let (ctx, _) = TaskContext::background().with_timeout(Duration::from_millis(30));
    let started = Instant::now();
    assert_eq!(ctx.wait_cancelled(), Some(CancelReason::DeadlineExceeded));
    assert!(started.elapsed() >= Duration::from_millis(30));
  }

  #[test]
  fn wait_wakes_on_cancel_from_another_thread() {
    let (ctx, cancel) = TaskContext::background().with_cancel();
    let (child, _) = ctx.with_cancel();
    let canceller = thread::spawn(move || {
      thread::sleep(Duration::from_millis(20));
      cancel.cancel();
    });
    assert!(child.wait_cancelled_timeout(Duration::from_secs(5)));
    canceller.join().unwrap();
  }

  #[test]
  fn dropped_children_unlink_from_a_live_parent() {
    let (parent, cancel) = TaskContext::background().with_cancel();
    let links = |ctx: &TaskContext| ctx.signal.as_ref().unwrap().children.lock().len();

    for _ in 0..64 {
      let (child, _) = parent.with_cancel();
      let (_grandchild, _) = child.with_timeout(Duration::from_secs(60));
    }
    assert_eq!(links(&parent), 0);

    let (kept, _) = parent.with_cancel();
    assert_eq!(links(&parent), 1);
    cancel.cancel();
    assert!(kept.is_cancelled());
  }

  #[test]
  fn background_never_cancels() {
    let ctx = TaskContext::background();
    assert_eq!(ctx.wait_cancelled(), None);
    assert!(!ctx.wait_cancelled_timeout(Duration::from_millis(5)));
    assert_eq!(ctx.deadline(), None);
  }
}
