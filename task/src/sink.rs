//! Where task failures go.

use crate::context::{RequestId, TaskContext};
use crate::error::TaskFailure;

/// Receives every panic and returned error from dispatched tasks.
///
/// Implemented for any `Fn(Option<&TaskContext>, &TaskFailure)` closure, so
/// tests and small programs can pass one directly.
pub trait ErrorSink: Send + Sync {
  fn report_error(&self, ctx: Option<&TaskContext>, failure: &TaskFailure);
}

impl<F> ErrorSink for F
where
  F: Fn(Option<&TaskContext>, &TaskFailure) + Send + Sync,
{
  fn report_error(&self, ctx: Option<&TaskContext>, failure: &TaskFailure) {
    self(ctx, failure)
  }
}

/// The default sink: logs each failure at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
  fn report_error(&self, ctx: Option<&TaskContext>, failure: &TaskFailure) {
    let request_id = ctx
      .and_then(|ctx| ctx.value::<RequestId>())
      .map_or("-", RequestId::as_str);

    match failure {
      TaskFailure::Panicked { message } => {
        tracing::error!(origin = "background", request_id, "task panicked: {}", message);
      }
      TaskFailure::Returned(err) => {
        tracing::error!(request_id, error = %err, "task returned an error");
      }
    }
  }
}
