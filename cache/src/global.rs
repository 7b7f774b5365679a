//! The process-wide memory store and its typed helpers.

use crate::config::CacheConfig;
use crate::error::BuildError;
use crate::handle::TtlCache;
use crate::lazy::LazyCache;

use std::any::Any;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// A type-erased value, as stored by the process-wide memory store.
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// The type of the process-wide memory store.
pub type MemoryStore = TtlCache<String, AnyValue>;

static MEMORY_CONFIG: OnceCell<CacheConfig> = OnceCell::new();

// The one and only process-wide store, built on its first access.
static MEMORY: LazyCache<String, AnyValue> = LazyCache::new(build_memory_store);

// Fills MEMORY_CONFIG if still empty, so a later `configure_memory` fails
// instead of being silently ignored.
fn build_memory_store() -> Result<MemoryStore, BuildError> {
  MEMORY_CONFIG.get_or_init(CacheConfig::default).to_builder().build()
}

/// Sets the configuration for the process-wide store.
///
/// Must run before the first call to [`memory`]. Returns the rejected config
/// if one was already set or the store has already been built. An `Ok`
/// means the store is, or will be, built from `config`.
pub fn configure_memory(config: CacheConfig) -> Result<(), CacheConfig> {
  if MEMORY.get_if_initialized().is_some() {
    return Err(config);
  }
  MEMORY_CONFIG.set(config)
}

/// Provides a reference to the process-wide memory store.
///
/// The store and its sweep thread are created on the first call, exactly
/// once, no matter how many threads race to make it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use trellis_cache::memory;
///
/// memory().set_value("greeting".to_string(), "hello", Duration::from_secs(30));
/// assert_eq!(memory().get_as::<&str, _>("greeting"), Some("hello"));
/// ```
pub fn memory() -> &'static MemoryStore {
  MEMORY.get()
}

impl<K, H> TtlCache<K, AnyValue, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Boxes and stores a value of any type.
  pub fn set_value<T: Any + Send + Sync>(&self, key: K, value: T, ttl: Duration) {
    self.set(key, Box::new(value), ttl);
  }

  /// Retrieves a clone of the stored value if it exists and has type `T`.
  pub fn get_as<T, Q>(&self, key: &Q) -> Option<T>
  where
    T: Clone + 'static,
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self
      .get_with(key, |value| (**value).downcast_ref::<T>().cloned())
      .flatten()
  }
}
