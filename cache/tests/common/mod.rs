#![allow(dead_code)]

use std::time::Duration;

use trellis_cache::{CacheBuilder, TtlCache};

pub const TINY_TTL: Duration = Duration::from_millis(150);
pub const FAST_SWEEP: Duration = Duration::from_millis(20);
pub const SLEEP_MARGIN: Duration = Duration::from_millis(150);

// A cache with a janitor that ticks fast enough for sleep-based tests.
pub fn build_fast_cache<V: Send + Sync + 'static>() -> TtlCache<String, V> {
  CacheBuilder::new()
    .shards(4)
    .sweep_interval(FAST_SWEEP)
    .build()
    .unwrap()
}

// A cache whose janitor effectively never runs, so only lazy expiry is observable.
pub fn build_unswept_cache<V: Send + Sync + 'static>() -> TtlCache<String, V> {
  CacheBuilder::new()
    .shards(4)
    .sweep_interval(Duration::from_secs(3600))
    .build()
    .unwrap()
}
