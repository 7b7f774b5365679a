mod common;

use common::{build_fast_cache, build_unswept_cache};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use trellis_cache::NO_EXPIRATION;

#[test]
fn test_concurrent_writers_on_distinct_keys() {
  let cache = build_unswept_cache::<usize>();
  let num_threads = 8;
  let per_thread = 500;
  let barrier = Arc::new(Barrier::new(num_threads));

  let handles: Vec<_> = (0..num_threads)
    .map(|t| {
      let cache = cache.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        for i in 0..per_thread {
          cache.set(format!("{}-{}", t, i), i, NO_EXPIRATION);
        }
      })
    })
    .collect();

  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(cache.len(), num_threads * per_thread);
  assert_eq!(cache.get_with("3-499", |v| *v), Some(499));
  assert_eq!(cache.metrics().inserts, (num_threads * per_thread) as u64);
}

#[test]
fn test_same_key_last_write_wins_without_tearing() {
  let cache = build_unswept_cache::<(usize, usize)>();
  let barrier = Arc::new(Barrier::new(4));

  let handles: Vec<_> = (0..4)
    .map(|t| {
      let cache = cache.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        for i in 0..1_000 {
          cache.set("shared".to_string(), (t, t * i), NO_EXPIRATION);
        }
      })
    })
    .collect();

  for handle in handles {
    handle.join().unwrap();
  }

  // Whoever wrote last, the pair must be internally consistent.
  let (t, product) = *cache.get("shared").unwrap();
  assert_eq!(product, t * 999);
  assert_eq!(cache.len(), 1);
}

#[test]
fn test_readers_and_sweeper_interleave() {
  let cache = build_fast_cache::<u64>();
  for i in 0..200u64 {
    let ttl = if i % 2 == 0 {
      Duration::from_millis(40)
    } else {
      NO_EXPIRATION
    };
    cache.set(i.to_string(), i, ttl);
  }

  let readers: Vec<_> = (0..4)
    .map(|_| {
      let cache = cache.clone();
      thread::spawn(move || {
        for _ in 0..50 {
          for i in (1..200u64).step_by(2) {
            assert_eq!(cache.get_with(i.to_string().as_str(), |v| *v), Some(i));
          }
          thread::sleep(Duration::from_millis(2));
        }
      })
    })
    .collect();

  for reader in readers {
    reader.join().unwrap();
  }

  thread::sleep(Duration::from_millis(100));
  assert_eq!(cache.len(), 100);
  assert_eq!(cache.metrics().len, 100, "Expired half should be swept");
  // Eviction is monotonic: nothing comes back.
  assert!(cache.get("0").is_none());
}
