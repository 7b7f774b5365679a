mod common;

use common::{build_fast_cache, build_unswept_cache, FAST_SWEEP, SLEEP_MARGIN, TINY_TTL};
use std::thread;
use std::time::Duration;
use trellis_cache::NO_EXPIRATION;

#[test]
fn test_item_expires_after_ttl() {
  let cache = build_fast_cache::<&str>();

  cache.set("key".to_string(), "value", TINY_TTL);
  assert_eq!(cache.get("key").as_deref(), Some(&"value"));

  thread::sleep(TINY_TTL + SLEEP_MARGIN);
  assert!(cache.get("key").is_none(), "Item should have expired");

  let metrics = cache.metrics();
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.len, 0, "The sweep should have removed the entry");
  assert_eq!(metrics.evicted_by_sweep, 1);
}

#[test]
fn test_expired_item_is_hidden_before_any_sweep() {
  let cache = build_unswept_cache::<u32>();

  cache.set("key".to_string(), 7, Duration::from_millis(30));
  thread::sleep(Duration::from_millis(80));

  // The janitor has not run, yet the entry must already read as absent.
  assert!(cache.get("key").is_none());
  assert!(!cache.contains_key("key"));

  let metrics = cache.metrics();
  assert_eq!(metrics.expired_on_read, 1);
  assert_eq!(metrics.len, 1, "Entry is still physically stored");
  assert_eq!(metrics.evicted_by_sweep, 0);

  assert_eq!(cache.sweep_now(), 1);
  assert_eq!(cache.metrics().len, 0);
}

#[test]
fn test_zero_ttl_never_expires() {
  let cache = build_fast_cache::<u32>();

  cache.set("forever".to_string(), 42, NO_EXPIRATION);
  // Many sweep intervals pass.
  thread::sleep(FAST_SWEEP * 15);

  assert_eq!(cache.get("forever").as_deref(), Some(&42));
  assert!(cache.metrics().sweeps >= 5);
  assert_eq!(cache.metrics().evicted_by_sweep, 0);
}

#[test]
fn test_overwrite_resets_ttl() {
  let cache = build_unswept_cache::<u32>();

  cache.set("key".to_string(), 1, Duration::from_millis(50));
  cache.set("key".to_string(), 2, NO_EXPIRATION);
  thread::sleep(Duration::from_millis(100));

  assert_eq!(cache.get("key").as_deref(), Some(&2));
  let metrics = cache.metrics();
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.updates, 1);
}

#[test]
fn test_item_alive_until_ttl_elapses() {
  let cache = build_fast_cache::<u32>();
  let ttl = Duration::from_millis(400);

  cache.set("key".to_string(), 1, ttl);
  thread::sleep(ttl / 4);
  assert!(cache.get("key").is_some());
  thread::sleep(ttl / 4);
  assert!(cache.get("key").is_some(), "Should still be alive at half the TTL");

  thread::sleep(ttl + SLEEP_MARGIN);
  assert!(cache.get("key").is_none());
}
