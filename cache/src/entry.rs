use crate::time;

use std::sync::Arc;
use std::time::Duration;

/// The sentinel expiry value meaning "never expires".
pub(crate) const NEVER: u64 = 0;

/// A container for a value in the cache, holding its expiry metadata.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Arc<V>,
  /// The expiration timestamp in nanoseconds since the cache epoch.
  /// `NEVER` means no TTL.
  expires_at: u64,
}

impl<V> CacheEntry<V> {
  /// Creates a new `CacheEntry`. A zero `ttl` never expires.
  pub(crate) fn new(value: V, ttl: Duration) -> Self {
    Self {
      value: Arc::new(value),
      expires_at: time::expiry_from_ttl(ttl),
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  #[inline]
  pub(crate) fn value_ref(&self) -> &V {
    &self.value
  }

  #[inline]
  pub(crate) fn expires_at(&self) -> u64 {
    self.expires_at
  }

  /// Checks expiry against a caller-sampled timestamp.
  #[inline]
  pub(crate) fn is_expired_at(&self, now_nanos: u64) -> bool {
    self.expires_at != NEVER && now_nanos > self.expires_at
  }

  #[inline]
  pub(crate) fn is_expired(&self) -> bool {
    self.is_expired_at(time::now_nanos())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_ttl_is_never() {
    let entry = CacheEntry::new("v", Duration::ZERO);
    assert_eq!(entry.expires_at(), NEVER);
    assert!(!entry.is_expired_at(u64::MAX));
  }

  #[test]
  fn expiry_is_strictly_after_deadline() {
    let entry = CacheEntry::new(1u8, Duration::from_secs(5));
    let deadline = entry.expires_at();
    assert!(!entry.is_expired_at(deadline));
    assert!(entry.is_expired_at(deadline + 1));
  }
}
