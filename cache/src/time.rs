use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single, static reference point for all expiry timestamps.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Converts an `Instant` into nanoseconds since the cache's epoch.
#[inline]
pub(crate) fn instant_to_nanos(instant: Instant) -> u64 {
  instant.saturating_duration_since(*CACHE_EPOCH).as_nanos() as u64
}

/// The current time as nanoseconds since the epoch.
///
/// Never returns 0, so the value can't be confused with the "never expires"
/// sentinel used by `CacheEntry`.
#[inline]
pub(crate) fn now_nanos() -> u64 {
  instant_to_nanos(Instant::now()).max(1)
}

/// Computes an absolute expiry timestamp for a TTL starting now.
/// A zero TTL maps to the sentinel `0`.
#[inline]
pub(crate) fn expiry_from_ttl(ttl: Duration) -> u64 {
  if ttl.is_zero() {
    return 0;
  }
  now_nanos().saturating_add(ttl.as_nanos().min(u64::MAX as u128) as u64)
}
