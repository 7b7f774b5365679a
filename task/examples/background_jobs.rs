use std::time::Duration;

use trellis_cache::{memory, NO_EXPIRATION};
use trellis_logging::LoggingConfig;
use trellis_pool::PoolsConfig;
use trellis_task::{RequestId, TaskContext};

const APP_CONFIG: &str = r#"
logging:
  level: debug
  format: compact
  thread_names: true
pools:
  release_timeout: 2s
  entries:
    - name: mail
      size: 2
      block_after: 10
"#;

fn main() {
  let logging = LoggingConfig::from_yaml_str(APP_CONFIG).expect("Failed to parse logging config");
  let _guard = trellis_logging::init(&logging).expect("Failed to initialize logging");

  let pools = PoolsConfig::from_yaml_str(APP_CONFIG).expect("Failed to parse pools config");
  pools
    .register_all(trellis_pool::global())
    .expect("Failed to register pools");
  println!("Registered pools: {:?}", trellis_pool::global().pools());

  let ctx = TaskContext::background().with_value(RequestId::new("req-1"));

  // Runs on the "mail" pool and leaves a note in the process-wide cache.
  let mail = trellis_task::execute_with_context(&ctx, Some("mail"), |ctx| {
    let id = ctx.value::<RequestId>().map(RequestId::to_string).unwrap_or_default();
    memory().set_value(format!("mail:{}", id), "sent", NO_EXPIRATION);
  })
  .expect("Failed to dispatch mail task");
  println!("mail task finished as {:?}", mail.wait());
  println!("cache says: {:?}", memory().get_as::<&str, _>("mail:req-1"));

  // An unknown pool logs a warning and runs the task on its own thread.
  let fallback = trellis_task::execute(Some("reports"), || println!("report generated"))
    .expect("Failed to dispatch report task");
  println!("report task finished as {:?}", fallback.wait());

  // Panics are caught and logged; the program carries on.
  let crashing = trellis_task::execute(Some("mail"), || panic!("smtp connection reset"))
    .expect("Failed to dispatch crashing task");
  println!("crashing task finished as {:?}", crashing.wait());

  // The task gives up once its deadline passes.
  let slow = trellis_task::execute_with_timeout(&ctx, Duration::from_millis(100), None, |ctx| {
    match ctx.wait_cancelled() {
      Some(reason) => Err(format!("gave up: {}", reason)),
      None => Ok(()),
    }
  })
  .expect("Failed to dispatch slow task");
  println!("slow task finished as {:?}", slow.wait());

  if let Err(err) = trellis_pool::global().unregister_all(pools.release_timeout) {
    eprintln!("shutdown: {}", err);
  }
}
