#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use trellis_pool::{PoolRegistry, PoolSize, WorkerPool};
use trellis_task::{ErrorSink, Executor, RequestId, TaskContext, TaskFailure};

pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// One call to the sink, flattened so tests can compare it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
  pub message: String,
  pub is_panic: bool,
  pub tags: Vec<(&'static str, &'static str)>,
  pub request_id: Option<String>,
  pub had_context: bool,
}

#[derive(Clone, Default)]
pub struct RecordingSink {
  reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingSink {
  pub fn reports(&self) -> Vec<Report> {
    self.reports.lock().unwrap().clone()
  }
}

impl ErrorSink for RecordingSink {
  fn report_error(&self, ctx: Option<&TaskContext>, failure: &TaskFailure) {
    self.reports.lock().unwrap().push(Report {
      message: failure.to_string(),
      is_panic: failure.is_panic(),
      tags: failure.tags().to_vec(),
      request_id: ctx.and_then(|c| c.value::<RequestId>()).map(|id| id.to_string()),
      had_context: ctx.is_some(),
    });
  }
}

/// An executor over a private registry holding one pool per `(name, size, block_after)`.
pub fn executor_with_pools(pools: &[(&str, usize, Option<usize>)]) -> (Executor, RecordingSink) {
  let registry = Arc::new(PoolRegistry::new());
  for (name, size, block_after) in pools {
    let mut builder = WorkerPool::builder().name(*name).size(PoolSize::Bounded(*size));
    if let Some(max) = block_after {
      builder = builder.max_blocking(*max);
    }
    registry.register(*name, builder.build().unwrap()).unwrap();
  }

  let sink = RecordingSink::default();
  let executor = Executor::new().with_registry(registry).with_sink(sink.clone());
  (executor, sink)
}
