mod common;

use std::fmt;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use common::{executor_with_pools, WAIT_LIMIT};
use trellis_task::{CancelReason, RequestId, TaskContext, TaskState};

const TIMEOUT: Duration = Duration::from_millis(50);
// Scheduling slack allowed on top of the timeout.
const MARGIN: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct LookupFailed;

impl fmt::Display for LookupFailed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "lookup failed")
  }
}

impl std::error::Error for LookupFailed {}

#[test]
fn test_deadline_fires_near_the_requested_timeout() {
  let (executor, _) = executor_with_pools(&[]);
  let (tx, rx) = mpsc::channel();
  let launched = Instant::now();

  let handle = executor
    .execute_with_timeout(&TaskContext::background(), TIMEOUT, None, move |ctx| {
      let reason = ctx.wait_cancelled();
      tx.send((reason, launched.elapsed())).unwrap();
      Ok::<(), LookupFailed>(())
    })
    .unwrap();

  let (reason, elapsed) = rx.recv_timeout(WAIT_LIMIT).unwrap();
  assert_eq!(reason, Some(CancelReason::DeadlineExceeded));
  assert!(elapsed >= TIMEOUT, "woke early after {:?}", elapsed);
  assert!(elapsed < TIMEOUT + MARGIN, "woke late after {:?}", elapsed);
  assert_eq!(handle.wait_timeout(WAIT_LIMIT), Some(TaskState::Cancelled));
}

#[test]
fn test_zero_timeout_sets_no_deadline() {
  let (executor, _) = executor_with_pools(&[]);
  let (tx, rx) = mpsc::channel();

  let handle = executor
    .execute_with_timeout(&TaskContext::background(), Duration::ZERO, None, move |ctx| {
      tx.send((ctx.deadline(), ctx.is_cancelled())).unwrap();
      Ok::<(), LookupFailed>(())
    })
    .unwrap();

  assert_eq!(rx.recv_timeout(WAIT_LIMIT).unwrap(), (None, false));
  assert_eq!(handle.wait_timeout(WAIT_LIMIT), Some(TaskState::Completed));
}

#[test]
fn test_returned_error_reaches_the_sink_with_its_context() {
  let (executor, sink) = executor_with_pools(&[]);
  let ctx = TaskContext::background().with_value(RequestId::new("req-42"));

  let handle = executor
    .execute_with_timeout(&ctx, Duration::from_secs(1), None, |_ctx| Err(LookupFailed))
    .unwrap();
  assert_eq!(handle.wait_timeout(WAIT_LIMIT), Some(TaskState::Completed));

  let reports = sink.reports();
  assert_eq!(reports.len(), 1);
  assert!(!reports[0].is_panic);
  assert!(reports[0].message.contains("lookup failed"));
  assert!(reports[0].tags.is_empty());
  assert_eq!(reports[0].request_id.as_deref(), Some("req-42"));
}

#[test]
fn test_caller_cancellation_reaches_the_task() {
  let (executor, _) = executor_with_pools(&[("workers", 2, None)]);
  let (ctx, cancel) = TaskContext::background().with_cancel();
  let (tx, rx) = mpsc::channel();

  let handle = executor
    .execute_with_context(&ctx, Some("workers"), move |ctx| {
      tx.send(ctx.wait_cancelled()).unwrap();
    })
    .unwrap();

  cancel.cancel();
  assert_eq!(rx.recv_timeout(WAIT_LIMIT).unwrap(), Some(CancelReason::Cancelled));
  assert_eq!(handle.wait_timeout(WAIT_LIMIT), Some(TaskState::Cancelled));
}

#[test]
fn test_task_sees_caller_values() {
  let (executor, _) = executor_with_pools(&[]);
  let ctx = TaskContext::background().with_value(RequestId::new("abc"));
  let (tx, rx) = mpsc::channel();

  executor
    .execute_with_context(&ctx, None, move |ctx| {
      tx.send(ctx.value::<RequestId>().cloned()).unwrap();
    })
    .unwrap();

  assert_eq!(rx.recv_timeout(WAIT_LIMIT).unwrap(), Some(RequestId::new("abc")));
  // The caller's own context is untouched by the task finishing.
  assert!(!ctx.is_cancelled());
}

#[test]
fn test_task_deadline_is_bounded_by_the_caller() {
  let (executor, _) = executor_with_pools(&[]);
  let (ctx, _cancel) = TaskContext::background().with_timeout(TIMEOUT);
  let caller_deadline = ctx.deadline();
  let (tx, rx) = mpsc::channel();

  executor
    .execute_with_timeout(&ctx, Duration::from_secs(60), None, move |ctx| {
      tx.send(ctx.deadline()).unwrap();
      Ok::<(), LookupFailed>(())
    })
    .unwrap();

  assert_eq!(rx.recv_timeout(WAIT_LIMIT).unwrap(), caller_deadline);
}
