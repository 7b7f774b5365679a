use std::time::Duration;

use serial_test::serial;
use trellis_cache::{configure_memory, memory, CacheConfig, NO_EXPIRATION};

#[derive(Debug, Clone, PartialEq)]
struct Session {
  user_id: u64,
}

#[test]
#[serial]
fn test_memory_is_a_single_instance() {
  let first = memory();
  let second = memory();
  assert!(first.ptr_eq(second));

  // Too late to reconfigure once built.
  assert!(configure_memory(CacheConfig::default()).is_err());
}

#[test]
#[serial]
fn test_memory_stores_values_of_any_type() {
  let store = memory();

  store.set_value("session:1".to_string(), Session { user_id: 1 }, NO_EXPIRATION);
  store.set_value("counter".to_string(), 41u64, Duration::from_secs(60));

  assert_eq!(store.get_as::<Session, _>("session:1"), Some(Session { user_id: 1 }));
  assert_eq!(store.get_as::<u64, _>("counter"), Some(41));
  // Wrong type reads as absent rather than panicking.
  assert_eq!(store.get_as::<String, _>("counter"), None);

  store.delete("session:1");
  store.delete("counter");
  assert!(store.get("counter").is_none());
}
