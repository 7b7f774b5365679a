// Runs in its own process so the memory store has not been built yet.

use std::time::Duration;

use trellis_cache::{configure_memory, memory, CacheConfig};

#[test]
fn test_configure_before_first_use_is_applied() {
  let config = CacheConfig {
    sweep_interval: Duration::from_millis(250),
    ..CacheConfig::default()
  };
  assert!(configure_memory(config).is_ok());
  assert_eq!(memory().sweep_interval(), Duration::from_millis(250));

  let late = CacheConfig {
    sweep_interval: Duration::from_secs(1),
    ..CacheConfig::default()
  };
  let rejected = configure_memory(late).unwrap_err();
  assert_eq!(rejected.sweep_interval, Duration::from_secs(1));
  assert_eq!(memory().sweep_interval(), Duration::from_millis(250));
}
